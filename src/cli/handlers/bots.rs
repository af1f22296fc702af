//! Group listing and bot registration handlers

use crate::cli::output::*;
use crate::groupme::BotManager;
use crate::groupme::GroupMeClient;
use crate::registry::BotRegistry;
use crate::Result;

/// Handle groups command
pub async fn handle_groups_command(
    client: &GroupMeClient,
    registry: &dyn BotRegistry,
) -> Result<()> {
    print_info("Getting groups...");
    let groups = client.get_all_groups().await?;
    let registered = registry.list_bots().await?;
    print_group_list(&groups, &registered);
    Ok(())
}

/// Create the bot in a group unless the group already has one
pub async fn handle_bot_add_command(
    bots: &dyn BotManager,
    registry: &dyn BotRegistry,
    group_id: &str,
) -> Result<()> {
    if let Some(record) = registry.bot_for_group(group_id).await? {
        print_warning(&format!(
            "Group {group_id} already has this bot ({})",
            record.bot_id
        ));
        return Ok(());
    }

    let bot_id = bots.create_bot(group_id).await?;
    registry.add_bot(group_id, &bot_id).await?;
    print_success(&format!("Added bot {bot_id} to group {group_id}"));
    Ok(())
}

/// Unregister first, then destroy upstream
pub async fn handle_bot_remove_command(
    bots: &dyn BotManager,
    registry: &dyn BotRegistry,
    group_id: &str,
) -> Result<()> {
    let Some(record) = registry.remove_bot(group_id).await? else {
        print_warning(&format!("Group {group_id} doesn't have this bot"));
        return Ok(());
    };

    bots.destroy_bot(&record.bot_id).await?;
    print_success(&format!(
        "Removed bot {} from group {group_id}",
        record.bot_id
    ));
    Ok(())
}

pub async fn handle_bot_list_command(registry: &dyn BotRegistry) -> Result<()> {
    let records = registry.list_bots().await?;
    print_bot_records(&records);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::registry::MemoryBotRegistry;

    #[derive(Default)]
    struct FakeBots {
        created: Mutex<Vec<String>>,
        destroyed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BotManager for FakeBots {
        async fn create_bot(&self, group_id: &str) -> Result<String> {
            self.created.lock().unwrap().push(group_id.to_string());
            Ok(format!("bot-{group_id}"))
        }

        async fn destroy_bot(&self, bot_id: &str) -> Result<()> {
            self.destroyed.lock().unwrap().push(bot_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_add_registers_new_bot_once() {
        let bots = FakeBots::default();
        let registry = MemoryBotRegistry::new();

        handle_bot_add_command(&bots, &registry, "g1").await.unwrap();
        handle_bot_add_command(&bots, &registry, "g1").await.unwrap();

        assert_eq!(*bots.created.lock().unwrap(), vec!["g1"]);
        let record = registry.bot_for_group("g1").await.unwrap().unwrap();
        assert_eq!(record.bot_id, "bot-g1");
    }

    #[tokio::test]
    async fn test_remove_destroys_registered_bot() {
        let bots = FakeBots::default();
        let registry = MemoryBotRegistry::new();
        registry.add_bot("g1", "b1").await.unwrap();

        handle_bot_remove_command(&bots, &registry, "g1").await.unwrap();
        handle_bot_remove_command(&bots, &registry, "g1").await.unwrap();

        assert_eq!(*bots.destroyed.lock().unwrap(), vec!["b1"]);
        assert!(registry.bot_for_group("g1").await.unwrap().is_none());
    }
}
