use std::sync::Arc;

use clap::Parser;
use memsbot::cli::*;
use memsbot::config::AppConfig;
use memsbot::groupme::GroupMeClient;
use memsbot::registry::BotRegistry;
use memsbot::registry::PgBotRegistry;
use memsbot::Result;
use tracing::info;

async fn connect_registry(config: &AppConfig) -> Result<Arc<dyn BotRegistry>> {
    let registry = PgBotRegistry::from_config(config).await?;
    registry.init_schema().await?;
    info!("Bot registry ready");
    Ok(Arc::new(registry))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    if cli.verbose {
        memsbot::logging::apply_backtrace_setting(config.logging.backtrace);
        memsbot::logging::init_logging_with_level("debug")?;
    } else {
        memsbot::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    if let Commands::Config = cli.command {
        return handle_config_command(&config);
    }

    config.require_access_token()?;
    let client = Arc::new(GroupMeClient::new(&config.groupme, &config.bot)?);

    let result = match cli.command {
        Commands::Groups => {
            let registry = connect_registry(&config).await?;
            handle_groups_command(&client, registry.as_ref()).await
        }
        Commands::Bot(BotCommands::Add { group }) => {
            let registry = connect_registry(&config).await?;
            handle_bot_add_command(client.as_ref(), registry.as_ref(), &group).await
        }
        Commands::Bot(BotCommands::Remove { group }) => {
            let registry = connect_registry(&config).await?;
            handle_bot_remove_command(client.as_ref(), registry.as_ref(), &group).await
        }
        Commands::Bot(BotCommands::List) => {
            let registry = connect_registry(&config).await?;
            handle_bot_list_command(registry.as_ref()).await
        }
        Commands::Preview { group, date } => {
            handle_preview_command(&config, client, &group, date.as_deref()).await
        }
        Commands::Post {
            group,
            date,
            bot_id,
            dry_run,
        } => {
            let registry = connect_registry(&config).await?;
            handle_post_command(
                &config,
                client,
                registry,
                &group,
                date.as_deref(),
                bot_id.as_deref(),
                dry_run,
            )
            .await
        }
        Commands::Config => handle_config_command(&config),
    };

    if let Err(e) = &result {
        print_error(&e.to_string());
    }
    result
}
