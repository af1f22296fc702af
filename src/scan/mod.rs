//! "On this day" scan of a group's history
//!
//! The history is read newest to oldest. Along the way the group size is
//! unwound through membership events, the bot's own reposts are recorded,
//! and messages from today's month and day in earlier years are checked
//! for popularity. One of the survivors is then drawn at random.

pub mod aggregator;
pub mod dedup;
pub mod history;
pub mod membership;
pub mod popularity;
pub mod selector;


pub use aggregator::Candidate;
pub use aggregator::CalendarDay;
pub use aggregator::DateMessageAggregator;
pub use aggregator::DayCandidates;
pub use aggregator::DayScan;
pub use dedup::Fingerprint;
pub use dedup::RepostDeduplicator;
pub use dedup::RepostLedger;
pub use dedup::RepostStatus;
pub use history::MessageHistoryReader;
pub use history::MessageSource;
pub use membership::count_named_users;
pub use membership::MembershipTracker;
pub use popularity::PopularityClassifier;
pub use popularity::PopularityThresholds;
pub use selector::MessageSelector;
