//! Logging configuration for MemsBot

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::Result;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "memsbot.log";
const BACKTRACE_ENV: &str = "RUST_BACKTRACE";

/// Value to export for `RUST_BACKTRACE`, if any
///
/// An explicit setting in the environment always wins over the config file.
pub fn backtrace_env_value(enabled: bool, current: Option<&str>) -> Option<&'static str> {
    match current {
        Some(_) => None,
        None if enabled => Some("1"),
        None => Some("0"),
    }
}

/// Export the configured backtrace setting unless the environment already has one
pub fn apply_backtrace_setting(enabled: bool) {
    let current = std::env::var(BACKTRACE_ENV).ok();
    if let Some(value) = backtrace_env_value(enabled, current.as_deref()) {
        std::env::set_var(BACKTRACE_ENV, value);
    }
}

/// Initialize logging system with file output
pub fn init_logging() -> Result<()> {
    init_logging_with_config(None)
}

/// Initialize logging with configuration
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    if let Some(config) = config {
        apply_backtrace_setting(config.logging.backtrace);
    }

    let env_filter = if let Some(config) = config {
        let level = &config.logging.level;
        EnvFilter::new(format!("{level},memsbot={level}"))
    } else {
        // Fallback to environment variable or default
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,memsbot=debug"))
    };

    let level = config.map_or("info", |c| c.logging.level.as_str());
    install(env_filter)?;
    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    Ok(())
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<()> {
    install(EnvFilter::new(format!("{level},memsbot={level}")))?;
    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    Ok(())
}

fn install(env_filter: EnvFilter) -> Result<()> {
    let logs_dir = Path::new(LOG_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::MemsBotError::Custom(format!("logging already initialized: {e}")))?;

    tracing::info!("Log files will be saved to: {LOG_DIR}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The writer thread must outlive every span, so the guard is never dropped
    std::mem::forget(guard);

    Ok(())
}

/// Initialize simple logging for testing
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .map_err(|e| crate::MemsBotError::Custom(format!("logging already initialized: {e}")))?;

    tracing::info!("Simple logging initialized");
    Ok(())
}
