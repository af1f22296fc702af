//! Preview and post handlers

use std::sync::Arc;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::Utc;

use crate::cli::output::*;
use crate::groupme::GroupMeClient;
use crate::registry::BotRegistry;
use crate::registry::MemoryBotRegistry;
use crate::scan::DateMessageAggregator;
use crate::scan::MessageSelector;
use crate::service::RepostService;
use crate::AppConfig;
use crate::MemsBotError;
use crate::Result;

/// Noon of `date` in the reference zone, or now when no date is given
pub fn parse_target_date(date: Option<&str>, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let Some(date) = date else {
        return Ok(Utc::now());
    };
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| MemsBotError::Custom(format!("Invalid date '{date}' (expected YYYY-MM-DD): {e}")))?;
    day.and_hms_opt(12, 0, 0)
        .and_then(|noon| noon.and_local_timezone(offset).single())
        .map(|noon| noon.with_timezone(&Utc))
        .ok_or_else(|| MemsBotError::Custom(format!("Invalid date '{date}'")))
}

/// Handle preview command
pub async fn handle_preview_command(
    config: &AppConfig,
    client: Arc<GroupMeClient>,
    group_id: &str,
    date: Option<&str>,
) -> Result<()> {
    let scan_config = config.scan_config();
    let offset = scan_config.reference_offset();
    let target = parse_target_date(date, offset)?;

    let mut service = RepostService::new(
        DateMessageAggregator::new(scan_config),
        MessageSelector::from_entropy(),
        client.clone(),
        client,
        Arc::new(MemoryBotRegistry::new()),
    );

    let day = service.aggregator().calendar_day(target);
    print_info(&format!(
        "Scanning group {group_id} for {}/{} before {}",
        day.month, day.day, day.year
    ));
    println!();

    let preview = service.preview(group_id, target).await?;
    print_day_candidates(&preview.pools, offset);

    match preview.pick {
        Some(pick) => {
            println!("🎲 Random pick:");
            print_candidate(&pick, offset);
        }
        None => print_info("Nothing would be posted"),
    }
    Ok(())
}

/// Handle post command
pub async fn handle_post_command(
    config: &AppConfig,
    client: Arc<GroupMeClient>,
    registry: Arc<dyn BotRegistry>,
    group_id: &str,
    date: Option<&str>,
    bot_id: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let scan_config = config.scan_config();
    let target = parse_target_date(date, scan_config.reference_offset())?;

    let mut service = RepostService::new(
        DateMessageAggregator::new(scan_config),
        MessageSelector::from_entropy(),
        client.clone(),
        client,
        registry,
    );

    let outcome = service
        .run_for_group(group_id, bot_id, target, dry_run)
        .await?;
    print_run_outcome(&outcome);
    Ok(())
}
