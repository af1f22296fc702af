//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - bots: Group listing and bot registration
//! - repost: Previewing and posting a day's memory
//! - info: Information display (config)

pub mod bots;
pub mod info;
pub mod repost;

// Re-export all public handlers
pub use bots::*;
pub use info::*;
pub use repost::*;
