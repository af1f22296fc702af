//! Candidate collection for one group and one calendar day

use chrono::DateTime;
use chrono::Datelike;
use chrono::Utc;

use super::dedup::BotMessage;
use super::dedup::RepostDeduplicator;
use super::dedup::RepostStatus;
use super::history::MessageHistoryReader;
use super::history::MessageSource;
use super::membership::MembershipTracker;
use super::popularity::PopularityClassifier;
use crate::config::ScanConfig;
use crate::models::Message;
use crate::Result;

/// A popular message together with the group size it was measured against
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub message: Message,
    pub membership: i64,
    pub repost_status: RepostStatus,
}

impl Candidate {
    pub fn endorsers(&self) -> usize {
        self.message.endorsers()
    }

    /// Share of the group that liked the message
    ///
    /// A non-positive membership estimate counts as a group of one.
    pub fn score(&self) -> f64 {
        self.endorsers() as f64 / self.membership.max(1) as f64
    }
}

/// Month and day to look for, plus the year whose messages are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDay {
    pub fn of(instant: DateTime<Utc>, offset: chrono::FixedOffset) -> Self {
        let local = instant.with_timezone(&offset);
        Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
        }
    }

    /// Same month and day in an earlier year
    pub fn is_anniversary<T: Datelike>(&self, date: &T) -> bool {
        date.year() != self.year && date.month() == self.month && date.day() == self.day
    }
}

/// The two candidate pools of a day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayCandidates {
    /// Popular and never reposted
    pub fresh: Vec<Candidate>,
    /// Popular but reposted before; used only when `fresh` is empty
    pub reposted: Vec<Candidate>,
}

impl DayCandidates {
    pub fn is_empty(&self) -> bool {
        self.fresh.is_empty() && self.reposted.is_empty()
    }

    /// Fresh candidates if there are any, otherwise the reposted ones
    pub fn into_preferred(self) -> Vec<Candidate> {
        if self.fresh.is_empty() {
            self.reposted
        } else {
            self.fresh
        }
    }
}

/// Counters reported at the end of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub messages_scanned: usize,
    pub on_target_day: usize,
    pub reposts_recognised: usize,
    pub skipped_recent_reposts: usize,
}

/// State of one backward pass over one group's history
///
/// Owns the membership counter, the repost ledger and the pools, so two
/// groups never share anything.
pub struct DayScan<'a> {
    config: &'a ScanConfig,
    classifier: &'a PopularityClassifier,
    day: CalendarDay,
    tracker: MembershipTracker,
    dedup: RepostDeduplicator,
    pools: DayCandidates,
    summary: ScanSummary,
}

impl<'a> DayScan<'a> {
    pub fn new(
        config: &'a ScanConfig,
        classifier: &'a PopularityClassifier,
        day: CalendarDay,
        current_member_count: i64,
    ) -> Self {
        Self {
            config,
            classifier,
            day,
            tracker: MembershipTracker::new(current_member_count, &config.system_sender_name),
            dedup: RepostDeduplicator::new(&config.bot_name, &config.context_prefix),
            pools: DayCandidates::default(),
            summary: ScanSummary::default(),
        }
    }

    /// Messages must arrive newest first
    ///
    /// Only messages from the target month and day of earlier years reach
    /// the membership tracker and the repost ledger.
    pub fn visit(&mut self, message: Message) {
        self.summary.messages_scanned += 1;
        let posted = message.created_at_in(self.config.reference_offset());
        if !self.day.is_anniversary(&posted) {
            return;
        }
        self.summary.on_target_day += 1;

        let membership = self.tracker.visit(&message);

        if self.dedup.is_own_message(&message) {
            match self.dedup.observe_bot_message(&message, posted.year()) {
                BotMessage::Repost(_) => {
                    self.summary.reposts_recognised += 1;
                    return;
                }
                BotMessage::ContextHeader => return,
                BotMessage::Unrecognized => {}
            }
        }

        if message.is_automated() {
            return;
        }

        let status = self
            .dedup
            .status_of(&message, self.day.year, self.config.lookback_years);
        if let RepostStatus::RepostedRecently { year } = status {
            self.summary.skipped_recent_reposts += 1;
            tracing::debug!(message_id = %message.id, year, "skipping message reposted too recently");
            return;
        }

        if !self
            .classifier
            .is_popular(&message.text, message.endorsers(), membership)
        {
            return;
        }

        tracing::debug!(
            message_id = %message.id,
            created_at = message.created_at,
            endorsers = message.endorsers(),
            membership,
            ?status,
            "adding popular message"
        );
        let candidate = Candidate {
            message,
            membership,
            repost_status: status,
        };
        match status {
            RepostStatus::Fresh => self.pools.fresh.push(candidate),
            _ => self.pools.reposted.push(candidate),
        }
    }

    pub fn summary(&self) -> ScanSummary {
        self.summary
    }

    pub fn finish(self) -> (DayCandidates, ScanSummary) {
        (self.pools, self.summary)
    }
}

/// Scans a group's full history for popular messages from this day in past years
#[derive(Debug, Clone)]
pub struct DateMessageAggregator {
    config: ScanConfig,
    classifier: PopularityClassifier,
}

impl DateMessageAggregator {
    pub fn new(config: ScanConfig) -> Self {
        let classifier = PopularityClassifier::new(config.thresholds.clone(), &config.excluded_phrase);
        Self { config, classifier }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn calendar_day(&self, target: DateTime<Utc>) -> CalendarDay {
        CalendarDay::of(target, self.config.reference_offset())
    }

    /// Both pools for `target`'s month and day
    pub async fn collect_pools<S: MessageSource + ?Sized>(
        &self,
        source: &S,
        group_id: &str,
        target: DateTime<Utc>,
    ) -> Result<DayCandidates> {
        let day = self.calendar_day(target);
        let members = source.current_member_count(group_id).await?;
        let mut scan = DayScan::new(&self.config, &self.classifier, day, members);
        let mut reader = MessageHistoryReader::new(source, group_id, self.config.page_size);

        while let Some(batch) = reader.next_batch().await? {
            for message in batch {
                scan.visit(message);
            }
        }

        let (pools, summary) = scan.finish();
        tracing::info!(
            group_id,
            month = day.month,
            day = day.day,
            members,
            pages = reader.pages_read(),
            scanned = summary.messages_scanned,
            on_day = summary.on_target_day,
            reposts = summary.reposts_recognised,
            skipped_recent = summary.skipped_recent_reposts,
            fresh = pools.fresh.len(),
            reposted = pools.reposted.len(),
            "finished scanning group history"
        );
        Ok(pools)
    }

    /// Popular messages from `target`'s month and day in earlier years
    ///
    /// Previously reposted messages are returned only when nothing fresh is
    /// left.
    pub async fn popular_messages_on<S: MessageSource + ?Sized>(
        &self,
        source: &S,
        group_id: &str,
        target: DateTime<Utc>,
    ) -> Result<Vec<Candidate>> {
        Ok(self
            .collect_pools(source, group_id, target)
            .await?
            .into_preferred())
    }
}
