use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemsBotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GroupMe API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("No bot registered for group {0}")]
    BotNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, MemsBotError>;
