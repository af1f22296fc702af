//! Recognition of the bot's own reposts and the ledger of reposted content
//!
//! A repost renders as `"<text>" \n\n- <author> | <m>/<d>/<yy> | ❤️x<n>` with
//! the original picture attached. Stripping the byline and the quotes gives
//! back the original text, and text plus first attachment URL is the
//! fingerprint both sides are compared by.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::Message;

static BYLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" \n\n- .* \| \d{1,2}/\d{1,2}/\d{2} \| ❤️x\d*").expect("byline pattern is valid")
});

/// Content key: body text followed by the first attachment URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(text: &str, attachment_url: Option<&str>) -> Self {
        let mut key = String::with_capacity(text.len() + attachment_url.map_or(0, str::len));
        key.push_str(text);
        if let Some(url) = attachment_url {
            key.push_str(url);
        }
        Self(key)
    }

    pub fn of_message(message: &Message) -> Self {
        Self::new(&message.text, message.first_attachment_url())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Original body of a rendered repost, without byline and wrapping quotes
///
/// Returns `None` when the text carries no byline.
pub fn strip_repost_byline(text: &str) -> Option<&str> {
    let byline = BYLINE.find_iter(text).last()?;
    let quoted = &text[..byline.start()];
    let body = quoted.strip_prefix('"').unwrap_or(quoted);
    Some(body.strip_suffix('"').unwrap_or(body))
}

/// How a bot-authored message was understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotMessage {
    /// The context line posted next to a repost
    ContextHeader,
    Repost(Fingerprint),
    /// No byline; handled like any other message
    Unrecognized,
}

/// Where a piece of content stands relative to the target year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepostStatus {
    Fresh,
    /// Reposted before the lookback window; only a fallback candidate
    RepostedLongAgo { year: i32 },
    /// Reposted inside the lookback window; not a candidate at all
    RepostedRecently { year: i32 },
}

/// Most recent repost year per fingerprint
#[derive(Debug, Clone, Default)]
pub struct RepostLedger {
    years: HashMap<Fingerprint, i32>,
}

impl RepostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a repost unless the fingerprint is already known
    ///
    /// A backward scan meets the newest repost first, so the first year
    /// recorded is the most recent one and must not be replaced.
    pub fn record_if_absent(&mut self, fingerprint: Fingerprint, year: i32) -> bool {
        match self.years.entry(fingerprint) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(year);
                true
            }
        }
    }

    pub fn year_of(&self, fingerprint: &Fingerprint) -> Option<i32> {
        self.years.get(fingerprint).copied()
    }

    pub fn status(&self, fingerprint: &Fingerprint, target_year: i32, lookback_years: i32) -> RepostStatus {
        match self.year_of(fingerprint) {
            Some(year) if year >= target_year - lookback_years => RepostStatus::RepostedRecently { year },
            Some(year) if year > 0 => RepostStatus::RepostedLongAgo { year },
            _ => RepostStatus::Fresh,
        }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Recognises the bot's reposts and tracks them for one scan
#[derive(Debug, Clone)]
pub struct RepostDeduplicator {
    bot_name: String,
    context_prefix: String,
    ledger: RepostLedger,
}

impl RepostDeduplicator {
    pub fn new(bot_name: &str, context_prefix: &str) -> Self {
        Self {
            bot_name: bot_name.to_string(),
            context_prefix: context_prefix.to_string(),
            ledger: RepostLedger::new(),
        }
    }

    pub fn is_own_message(&self, message: &Message) -> bool {
        message.name == self.bot_name
    }

    pub fn classify_bot_message(&self, message: &Message) -> BotMessage {
        if !self.context_prefix.is_empty() && message.text.starts_with(&self.context_prefix) {
            return BotMessage::ContextHeader;
        }
        match strip_repost_byline(&message.text) {
            Some(body) => BotMessage::Repost(Fingerprint::new(body, message.first_attachment_url())),
            None => BotMessage::Unrecognized,
        }
    }

    /// Feed one of the bot's own messages into the ledger
    ///
    /// Returns the classification so the caller can log or skip it.
    pub fn observe_bot_message(&mut self, message: &Message, year: i32) -> BotMessage {
        let classified = self.classify_bot_message(message);
        if let BotMessage::Repost(fingerprint) = &classified {
            if self.ledger.record_if_absent(fingerprint.clone(), year) {
                tracing::debug!(year, fingerprint = %fingerprint, "recorded earlier repost");
            } else {
                tracing::debug!(fingerprint = %fingerprint, "repost already recorded with a later year");
            }
        }
        classified
    }

    pub fn status_of(&self, message: &Message, target_year: i32, lookback_years: i32) -> RepostStatus {
        self.ledger
            .status(&Fingerprint::of_message(message), target_year, lookback_years)
    }

    pub fn ledger(&self) -> &RepostLedger {
        &self.ledger
    }
}
