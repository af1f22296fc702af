pub mod cli;
pub mod config;
pub mod errors;
pub mod groupme;
pub mod logging;
pub mod models;
pub mod registry;
pub mod repost;
pub mod scan;
pub mod service;


pub use config::AppConfig;
pub use errors::*;
