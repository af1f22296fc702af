//! GroupMe upstream: HTTP client, bot management and publishing

use async_trait::async_trait;

use crate::repost::Publisher;
use crate::repost::Repost;
use crate::Result;

mod client;

pub use client::GroupMeClient;

/// Creating and removing the bot in a group
#[async_trait]
pub trait BotManager: Send + Sync {
    /// Returns the new bot's id
    async fn create_bot(&self, group_id: &str) -> Result<String>;
    async fn destroy_bot(&self, bot_id: &str) -> Result<()>;
}

#[async_trait]
impl Publisher for GroupMeClient {
    async fn publish(&self, bot_id: &str, repost: &Repost) -> Result<()> {
        self.post_as_bot(bot_id, &repost.text, repost.picture_url.as_deref())
            .await?;
        tracing::info!(bot_id, "Posted repost");
        Ok(())
    }
}
