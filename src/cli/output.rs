//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `memsbot` CLI

use chrono::FixedOffset;

use crate::models::Group;
use crate::registry::BotRecord;
use crate::scan::Candidate;
use crate::scan::DayCandidates;
use crate::scan::RepostStatus;
use crate::service::RunOutcome;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// # Arguments
/// * `s` - The string to truncate
/// * `max_chars` - Maximum number of characters (not bytes)
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print groups, marking the ones the bot is registered in
pub fn print_group_list(groups: &[Group], registered: &[BotRecord]) {
    println!("Found {} groups:", groups.len());
    for group in groups {
        let bot = registered
            .iter()
            .find(|r| r.group_id == group.group_id())
            .map_or(String::new(), |r| format!(" | 🤖 {}", r.bot_id));
        println!(
            "  - {} | {} | {} members{bot}",
            group.group_id(),
            group.name,
            group.member_count()
        );
    }
}

pub fn print_bot_records(records: &[BotRecord]) {
    if records.is_empty() {
        print_info("No groups have the bot yet");
        return;
    }
    println!("Found {} registered groups:", records.len());
    for record in records {
        println!(
            "  - Group: {} | Bot: {} | Last posted: {}",
            record.group_id,
            record.bot_id,
            record.last_message_id.as_deref().unwrap_or("N/A")
        );
    }
}

fn describe_status(status: RepostStatus) -> String {
    match status {
        RepostStatus::Fresh => "never reposted".to_string(),
        RepostStatus::RepostedLongAgo { year } => format!("reposted in {year}"),
        RepostStatus::RepostedRecently { year } => format!("reposted recently ({year})"),
    }
}

pub fn print_candidate(candidate: &Candidate, offset: FixedOffset) {
    let message = &candidate.message;
    let text = if message.text.is_empty() {
        "(no text)".to_string()
    } else {
        truncate_str(&message.text.replace('\n', " "), 80)
    };
    println!(
        "  - [{}] {} | {} | ❤️x{}/{} ({:.2}) | {}",
        message.id,
        message.created_at_in(offset).format("%Y-%m-%d %H:%M"),
        message.name,
        candidate.endorsers(),
        candidate.membership,
        candidate.score(),
        describe_status(candidate.repost_status)
    );
    println!("      {text}");
    if let Some(url) = message.first_attachment_url() {
        println!("      🖼️  {url}");
    }
}

pub fn print_day_candidates(pools: &DayCandidates, offset: FixedOffset) {
    println!("🆕 Fresh candidates: {}", pools.fresh.len());
    for candidate in &pools.fresh {
        print_candidate(candidate, offset);
    }
    println!();
    println!("♻️  Previously reposted: {}", pools.reposted.len());
    for candidate in &pools.reposted {
        print_candidate(candidate, offset);
    }
    println!();
}

pub fn print_run_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NothingToPost => print_info("No popular messages from this day; nothing posted"),
        RunOutcome::Posted {
            bot_id,
            candidate,
            repost,
            published,
        } => {
            if *published {
                print_success(&format!(
                    "Posted message {} through bot {bot_id}",
                    candidate.message.id
                ));
            } else {
                print_info(&format!(
                    "Dry run: would post message {} through bot {bot_id}",
                    candidate.message.id
                ));
            }
            println!();
            println!("{}", repost.text);
            if let Some(url) = &repost.picture_url {
                println!("🖼️  {url}");
            }
        }
    }
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 MemsBot Configuration:");
    println!();

    println!("💬 GroupMe:");
    println!("  API: {}", config.groupme.api_base_url);
    println!("  Access token: {}", mask_token(&config.groupme.access_token));
    println!("  Page size: {}", config.groupme.page_size);
    println!("  Request timeout: {}s", config.groupme.request_timeout_secs);
    println!();

    println!("🤖 Bot:");
    println!("  Name: {}", config.bot.name);
    println!("  Avatar: {}", config.bot.avatar_url);
    println!(
        "  Callback: {}",
        config.bot.callback_url.as_deref().unwrap_or("N/A")
    );
    println!("  Context prefix: {:?}", config.bot.context_prefix);
    println!();

    let thresholds = &config.scan.thresholds;
    println!("🔍 Scan:");
    println!("  System sender: {}", config.scan.system_sender_name);
    println!("  Excluded phrase: {:?}", config.scan.excluded_phrase);
    println!("  Lookback: {} year(s)", config.scan.lookback_years);
    println!("  UTC offset: {}h", config.scan.utc_offset_hours);
    println!(
        "  Thresholds: <= {} members: all but one | >= {} members: {} | otherwise {} + (members - {})/{}",
        thresholds.small_group_max,
        thresholds.large_group_min,
        thresholds.large_group_endorsers,
        thresholds.mid_base_endorsers,
        thresholds.small_group_max,
        thresholds.mid_step
    );
    println!();

    println!("🗄️  Database:");
    println!("  URL: {}", mask_database_url(config.database_url()));
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!("  Connection timeout: {}s", config.connection_timeout());
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
}

/// Show only the last four characters of a secret
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Mask database URL for logging (hide password)
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            format!(
                "{}://{}@{}:{}",
                parsed.scheme(),
                parsed.username(),
                host,
                parsed.port().unwrap_or(5432)
            )
        } else {
            "***masked***".to_string()
        }
    } else {
        "***invalid***".to_string()
    }
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}
