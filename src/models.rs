//! Data model of the GroupMe v3 API
//!
//! Older messages omit some fields (attachments, sender type, even text), so
//! every optional field has a default: no attachments, a human sender and an
//! empty body.

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// Who posted a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    #[default]
    User,
    Bot,
    System,
    /// Calendar, poll and other service senders
    #[serde(other)]
    Service,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    /// Mentions and emoji attachments carry no URL
    #[serde(default)]
    pub url: Option<String>,
}

/// A single chat message as returned by `GET /groups/:id/messages`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_type: SenderKind,
    /// Seconds since the Unix epoch
    pub created_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub favorited_by: Vec<String>,
    #[serde(default)]
    pub event: Option<Event>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Number of distinct users who liked the message
    pub fn endorsers(&self) -> usize {
        self.favorited_by.len()
    }

    /// URL of the first attachment, if it has one
    pub fn first_attachment_url(&self) -> Option<&str> {
        self.attachments.first().and_then(|a| a.url.as_deref())
    }

    /// Polls, calendar events, bots and the platform itself
    pub fn is_automated(&self) -> bool {
        self.sender_type != SenderKind::User
            || self.event.as_ref().is_some_and(|e| e.kind.contains("bot"))
    }

    pub fn created_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or_default()
    }

    /// Creation time in the reference zone
    pub fn created_at_in(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        self.created_at_utc().with_timezone(&offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nickname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<Member>,
}

impl Group {
    /// Identifier used in message and bot endpoints
    pub fn group_id(&self) -> &str {
        if self.group_id.is_empty() {
            &self.id
        } else {
            &self.group_id
        }
    }

    /// Member count right now; the scan unwinds it going back in time
    pub fn member_count(&self) -> i64 {
        self.members.len() as i64
    }
}

/// Every GroupMe response wraps its payload in `{"response": ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub response: Option<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotInfo {
    pub bot_id: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotCreation {
    pub bot: BotInfo,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
