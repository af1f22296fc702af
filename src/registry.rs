//! Which bot serves which group, and what it posted last

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::MemsBotError;
use crate::Result;

/// One group the bot has been added to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BotRecord {
    pub group_id: String,
    pub bot_id: String,
    pub last_message_id: Option<String>,
}

#[async_trait]
pub trait BotRegistry: Send + Sync {
    /// Register `bot_id` for `group_id`, replacing any previous bot
    async fn add_bot(&self, group_id: &str, bot_id: &str) -> Result<()>;

    async fn bot_for_group(&self, group_id: &str) -> Result<Option<BotRecord>>;

    /// Returns the removed record, if there was one
    async fn remove_bot(&self, group_id: &str) -> Result<Option<BotRecord>>;

    /// All registered groups, ordered by group id
    async fn list_bots(&self) -> Result<Vec<BotRecord>>;

    /// Fails with `BotNotFound` for an unregistered group
    async fn update_last_message_id(&self, group_id: &str, message_id: &str) -> Result<()>;
}

/// Registry backed by a Postgres table
#[derive(Debug, Clone)]
pub struct PgBotRegistry {
    pool: PgPool,
}

impl PgBotRegistry {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new registry from configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;

        tracing::info!(
            "Database pool configured: max_connections={}, min_connections={}",
            config.max_connections(),
            config.min_connections()
        );

        Ok(Self::new(pool))
    }

    /// Create the registry table if it does not exist yet
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS group_bots (
                group_id TEXT PRIMARY KEY,
                bot_id TEXT NOT NULL,
                last_message_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BotRegistry for PgBotRegistry {
    async fn add_bot(&self, group_id: &str, bot_id: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO group_bots (group_id, bot_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id)
            DO UPDATE SET
                bot_id = EXCLUDED.bot_id,
                last_message_id = NULL,
                updated_at = NOW()
            ",
        )
        .bind(group_id)
        .bind(bot_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn bot_for_group(&self, group_id: &str) -> Result<Option<BotRecord>> {
        let record = sqlx::query_as::<_, BotRecord>(
            "SELECT group_id, bot_id, last_message_id FROM group_bots WHERE group_id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn remove_bot(&self, group_id: &str) -> Result<Option<BotRecord>> {
        let record = sqlx::query_as::<_, BotRecord>(
            "DELETE FROM group_bots WHERE group_id = $1 RETURNING group_id, bot_id, last_message_id",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_bots(&self) -> Result<Vec<BotRecord>> {
        let records = sqlx::query_as::<_, BotRecord>(
            "SELECT group_id, bot_id, last_message_id FROM group_bots ORDER BY group_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn update_last_message_id(&self, group_id: &str, message_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE group_bots SET last_message_id = $2, updated_at = NOW() WHERE group_id = $1",
        )
        .bind(group_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MemsBotError::BotNotFound(group_id.to_string()));
        }
        Ok(())
    }
}

/// In-process registry for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryBotRegistry {
    bots: DashMap<String, BotRecord>,
}

impl MemoryBotRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BotRegistry for MemoryBotRegistry {
    async fn add_bot(&self, group_id: &str, bot_id: &str) -> Result<()> {
        self.bots.insert(
            group_id.to_string(),
            BotRecord {
                group_id: group_id.to_string(),
                bot_id: bot_id.to_string(),
                last_message_id: None,
            },
        );
        Ok(())
    }

    async fn bot_for_group(&self, group_id: &str) -> Result<Option<BotRecord>> {
        Ok(self.bots.get(group_id).map(|entry| entry.value().clone()))
    }

    async fn remove_bot(&self, group_id: &str) -> Result<Option<BotRecord>> {
        Ok(self.bots.remove(group_id).map(|(_, record)| record))
    }

    async fn list_bots(&self) -> Result<Vec<BotRecord>> {
        let mut records: Vec<BotRecord> =
            self.bots.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        Ok(records)
    }

    async fn update_last_message_id(&self, group_id: &str, message_id: &str) -> Result<()> {
        let mut record = self
            .bots
            .get_mut(group_id)
            .ok_or_else(|| MemsBotError::BotNotFound(group_id.to_string()))?;
        record.last_message_id = Some(message_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_lookup() {
        let registry = MemoryBotRegistry::new();
        registry.add_bot("g1", "b1").await.unwrap();

        let record = registry.bot_for_group("g1").await.unwrap().unwrap();
        assert_eq!(record.bot_id, "b1");
        assert_eq!(record.last_message_id, None);
        assert!(registry.bot_for_group("g2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_re_adding_replaces_bot_and_clears_last_message() {
        let registry = MemoryBotRegistry::new();
        registry.add_bot("g1", "b1").await.unwrap();
        registry.update_last_message_id("g1", "m1").await.unwrap();
        registry.add_bot("g1", "b2").await.unwrap();

        let record = registry.bot_for_group("g1").await.unwrap().unwrap();
        assert_eq!(record.bot_id, "b2");
        assert_eq!(record.last_message_id, None);
    }

    #[tokio::test]
    async fn test_update_last_message_requires_registration() {
        let registry = MemoryBotRegistry::new();
        let err = registry.update_last_message_id("nope", "m1").await.unwrap_err();
        assert!(matches!(err, MemsBotError::BotNotFound(g) if g == "nope"));

        registry.add_bot("g1", "b1").await.unwrap();
        registry.update_last_message_id("g1", "m7").await.unwrap();
        let record = registry.bot_for_group("g1").await.unwrap().unwrap();
        assert_eq!(record.last_message_id.as_deref(), Some("m7"));
    }

    #[tokio::test]
    async fn test_remove_and_list() {
        let registry = MemoryBotRegistry::new();
        registry.add_bot("g2", "b2").await.unwrap();
        registry.add_bot("g1", "b1").await.unwrap();

        let groups: Vec<String> = registry
            .list_bots()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.group_id)
            .collect();
        assert_eq!(groups, vec!["g1", "g2"]);

        let removed = registry.remove_bot("g1").await.unwrap().unwrap();
        assert_eq!(removed.bot_id, "b1");
        assert!(registry.remove_bot("g1").await.unwrap().is_none());
        assert_eq!(registry.list_bots().await.unwrap().len(), 1);
    }
}
