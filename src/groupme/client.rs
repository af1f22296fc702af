//! HTTP client for the GroupMe v3 API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use url::Url;

use super::BotManager;
use crate::config::BotConfig;
use crate::config::GroupMeConfig;
use crate::errors::MemsBotError;
use crate::errors::Result;
use crate::models::BotCreation;
use crate::models::Envelope;
use crate::models::Group;
use crate::models::Message;
use crate::models::MessagePage;
use crate::scan::MessageSource;

/// Client for the groups, messages and bots endpoints
#[derive(Debug, Clone)]
pub struct GroupMeClient {
    client: Client,
    base_url: String,
    access_token: String,
    page_size: u32,
    bot: BotConfig,
}

#[derive(Serialize)]
struct BotSpec<'a> {
    name: &'a str,
    group_id: &'a str,
    avatar_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Serialize)]
struct CreateBotRequest<'a> {
    bot: BotSpec<'a>,
}

#[derive(Serialize)]
struct DestroyBotRequest<'a> {
    bot_id: &'a str,
}

#[derive(Serialize)]
struct BotPostRequest<'a> {
    bot_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture_url: Option<&'a str>,
}

impl GroupMeClient {
    /// Create a new client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid TLS configuration)
    pub fn new(config: &GroupMeConfig, bot: &BotConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            page_size: config.page_size,
            bot: bot.clone(),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            if !self.access_token.is_empty() {
                pairs.append_pair("token", &self.access_token);
            }
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn error_from(response: reqwest::Response) -> MemsBotError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        MemsBotError::Api { status, message }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!(path = url.path(), "GET");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.response)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<String> {
        debug!(path = url.path(), "POST");
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.text().await?)
    }

    /// One page of the groups the token's user belongs to; pages start at 1
    pub async fn get_groups_page(&self, page: u32) -> Result<Vec<Group>> {
        let url = self.endpoint("/groups", &[("page", &page.to_string())])?;
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    /// Every group, paging until an empty page comes back
    pub async fn get_all_groups(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for page in 1.. {
            let batch = self.get_groups_page(page).await?;
            if batch.is_empty() {
                break;
            }
            groups.extend(batch);
        }
        info!("Got {} groups", groups.len());
        Ok(groups)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group> {
        let url = self.endpoint(&format!("/groups/{group_id}"), &[])?;
        match self.get_json::<Group>(url).await {
            Ok(Some(group)) => Ok(group),
            Ok(None) => Err(MemsBotError::GroupNotFound(group_id.to_string())),
            Err(MemsBotError::Api { status: 404, .. }) => {
                Err(MemsBotError::GroupNotFound(group_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Messages older than `before_id`, newest first
    ///
    /// The API answers 304 Not Modified once there is nothing older; that and
    /// an empty body both yield an empty batch.
    pub async fn get_message_batch(
        &self,
        group_id: &str,
        before_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        let limit = limit.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(before_id) = before_id {
            query.push(("before_id", before_id));
        }
        let url = self.endpoint(&format!("/groups/{group_id}/messages"), &query)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(Self::error_from(response).await);
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let envelope: Envelope<MessagePage> = serde_json::from_slice(&body)?;
        Ok(envelope.response.map(|page| page.messages).unwrap_or_default())
    }

    /// Register the bot in a group and return its id
    pub async fn create_bot(&self, group_id: &str) -> Result<String> {
        let url = self.endpoint("/bots", &[])?;
        let request = CreateBotRequest {
            bot: BotSpec {
                name: &self.bot.name,
                group_id,
                avatar_url: &self.bot.avatar_url,
                callback_url: self.bot.callback_url.as_deref(),
            },
        };
        let body = self.post_json(url, &request).await?;
        let envelope: Envelope<BotCreation> = serde_json::from_str(&body)?;
        let bot_id = envelope
            .response
            .map(|created| created.bot.bot_id)
            .ok_or_else(|| MemsBotError::Custom("bot creation returned no bot".to_string()))?;
        info!(group_id, bot_id = %bot_id, "Created bot");
        Ok(bot_id)
    }

    pub async fn destroy_bot(&self, bot_id: &str) -> Result<()> {
        let url = self.endpoint("/bots/destroy", &[])?;
        self.post_json(url, &DestroyBotRequest { bot_id }).await?;
        info!(bot_id, "Destroyed bot");
        Ok(())
    }

    /// Post as a bot; the bot id is the only credential this endpoint needs
    pub async fn post_as_bot(
        &self,
        bot_id: &str,
        text: &str,
        picture_url: Option<&str>,
    ) -> Result<()> {
        let url = Url::parse(&format!("{}/bots/post", self.base_url))?;
        let request = BotPostRequest {
            bot_id,
            text,
            picture_url,
        };
        self.post_json(url, &request).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageSource for GroupMeClient {
    async fn fetch_message_batch(
        &self,
        group_id: &str,
        before_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Message>> {
        self.get_message_batch(group_id, before_id, limit).await
    }

    async fn current_member_count(&self, group_id: &str) -> Result<i64> {
        Ok(self.get_group(group_id).await?.member_count())
    }
}

#[async_trait]
impl BotManager for GroupMeClient {
    async fn create_bot(&self, group_id: &str) -> Result<String> {
        GroupMeClient::create_bot(self, group_id).await
    }

    async fn destroy_bot(&self, bot_id: &str) -> Result<()> {
        GroupMeClient::destroy_bot(self, bot_id).await
    }
}
