//! One repost run for one group
//!
//! Resolves the group's bot, scans the history for the target day, draws a
//! message, posts it and remembers what was posted.

use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

use crate::registry::BotRegistry;
use crate::repost::Publisher;
use crate::repost::Repost;
use crate::scan::Candidate;
use crate::scan::DateMessageAggregator;
use crate::scan::DayCandidates;
use crate::scan::MessageSelector;
use crate::scan::MessageSource;
use crate::MemsBotError;
use crate::Result;

/// What a run ended with
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No popular message from this day in earlier years
    NothingToPost,
    Posted {
        bot_id: String,
        candidate: Candidate,
        repost: Repost,
        /// `false` on a dry run
        published: bool,
    },
}

/// Both pools plus the message a real run could have posted
#[derive(Debug, Clone)]
pub struct Preview {
    pub pools: DayCandidates,
    pub pick: Option<Candidate>,
}

pub struct RepostService<R: Rng = StdRng> {
    aggregator: DateMessageAggregator,
    selector: MessageSelector<R>,
    source: Arc<dyn MessageSource>,
    publisher: Arc<dyn Publisher>,
    registry: Arc<dyn BotRegistry>,
}

impl<R: Rng> RepostService<R> {
    pub fn new(
        aggregator: DateMessageAggregator,
        selector: MessageSelector<R>,
        source: Arc<dyn MessageSource>,
        publisher: Arc<dyn Publisher>,
        registry: Arc<dyn BotRegistry>,
    ) -> Self {
        Self {
            aggregator,
            selector,
            source,
            publisher,
            registry,
        }
    }

    pub fn aggregator(&self) -> &DateMessageAggregator {
        &self.aggregator
    }

    /// The explicit bot if given, else the one registered for the group
    ///
    /// The flag tells whether the bot is the group's registered one; posts by
    /// any other bot are not recorded.
    async fn resolve_bot(&self, group_id: &str, bot_id: Option<&str>) -> Result<(String, bool)> {
        let registered = self.registry.bot_for_group(group_id).await?.map(|r| r.bot_id);
        match (bot_id, registered) {
            (Some(explicit), registered) => {
                let is_registered = registered.as_deref() == Some(explicit);
                Ok((explicit.to_string(), is_registered))
            }
            (None, Some(registered)) => Ok((registered, true)),
            (None, None) => Err(MemsBotError::BotNotFound(group_id.to_string())),
        }
    }

    /// Scan and draw without posting anything
    pub async fn preview(&mut self, group_id: &str, target: DateTime<Utc>) -> Result<Preview> {
        let pools = self
            .aggregator
            .collect_pools(self.source.as_ref(), group_id, target)
            .await?;
        let pick = self.selector.select(pools.clone().into_preferred());
        Ok(Preview { pools, pick })
    }

    /// Post this day's memory into `group_id`
    ///
    /// Errors from the upstream end the run for this group only; nothing is
    /// posted or recorded in that case.
    pub async fn run_for_group(
        &mut self,
        group_id: &str,
        bot_id: Option<&str>,
        target: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<RunOutcome> {
        let (bot_id, registered) = self.resolve_bot(group_id, bot_id).await?;

        let candidates = self
            .aggregator
            .popular_messages_on(self.source.as_ref(), group_id, target)
            .await?;
        info!(
            group_id,
            candidates = candidates.len(),
            "Found popular messages from today"
        );

        let Some(candidate) = self.selector.select(candidates) else {
            info!(group_id, "Nothing to post");
            return Ok(RunOutcome::NothingToPost);
        };
        if candidate.endorsers() == 0 {
            info!(
                group_id,
                message_id = %candidate.message.id,
                "Selected message has no likes, nothing to post"
            );
            return Ok(RunOutcome::NothingToPost);
        }

        let repost = Repost::from_candidate(&candidate, self.aggregator.config().reference_offset());
        info!(
            group_id,
            message_id = %candidate.message.id,
            author = %candidate.message.name,
            endorsers = candidate.endorsers(),
            membership = candidate.membership,
            dry_run,
            "Posting message"
        );

        if !dry_run {
            self.publisher.publish(&bot_id, &repost).await?;
            if registered {
                self.registry
                    .update_last_message_id(group_id, &candidate.message.id)
                    .await?;
            }
        }

        Ok(RunOutcome::Posted {
            bot_id,
            candidate,
            repost,
            published: !dry_run,
        })
    }
}
