//! Rendering of a chosen message into the text the bot posts

use async_trait::async_trait;
use chrono::Datelike;
use chrono::FixedOffset;
use serde::Serialize;

use crate::models::Message;
use crate::scan::Candidate;
use crate::Result;

/// What gets posted: the rendered text and the original picture, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repost {
    pub text: String,
    pub picture_url: Option<String>,
}

impl Repost {
    pub fn from_message(message: &Message, offset: FixedOffset) -> Self {
        Self {
            text: render_repost_text(message, offset),
            picture_url: message.first_attachment_url().map(str::to_string),
        }
    }

    pub fn from_candidate(candidate: &Candidate, offset: FixedOffset) -> Self {
        Self::from_message(&candidate.message, offset)
    }
}

/// `"<body>" \n\n- <author> | <m>/<d>/<yy> | ❤️x<likes>`
///
/// An empty body leaves out the quotes entirely, so picture-only posts start
/// with the byline.
pub fn render_repost_text(message: &Message, offset: FixedOffset) -> String {
    let posted = message.created_at_in(offset);
    let body = if message.text.is_empty() {
        String::new()
    } else {
        format!("\"{}\"", message.text)
    };
    format!(
        "{body} \n\n- {} | {}/{}/{:02} | ❤️x{}",
        message.name,
        posted.month(),
        posted.day(),
        posted.year().rem_euclid(100),
        message.endorsers()
    )
}

/// Destination for rendered reposts
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Post `repost` into the group `bot_id` belongs to
    async fn publish(&self, bot_id: &str, repost: &Repost) -> Result<()>;
}
