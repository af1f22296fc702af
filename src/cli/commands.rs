//! CLI command definitions and argument parsing

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "memsbot")]
#[command(about = "Reposts the most popular GroupMe message from this day in past years")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the groups the access token's user belongs to
    Groups,
    /// Add, remove or list the bot in groups
    #[command(subcommand)]
    Bot(BotCommands),
    /// Show this day's candidates for a group and one random pick, without posting
    Preview {
        /// Group ID
        #[arg(short, long)]
        group: String,
        /// Day to look up (YYYY-MM-DD, default: today in the reference zone)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Pick a memory for a group and post it
    Post {
        /// Group ID
        #[arg(short, long)]
        group: String,
        /// Day to look up (YYYY-MM-DD, default: today in the reference zone)
        #[arg(short, long)]
        date: Option<String>,
        /// Post through this bot instead of the group's registered one
        #[arg(long)]
        bot_id: Option<String>,
        /// Render the repost but do not send it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
pub enum BotCommands {
    /// Create the bot in a group and register it
    Add {
        /// Group ID
        group: String,
    },
    /// Unregister the bot from a group and destroy it
    Remove {
        /// Group ID
        group: String,
    },
    /// List registered groups and their bots
    List,
}
