//! Group size over time, reconstructed while walking history newest to oldest
//!
//! The walk starts at today's member count. Every "X added Y" event seen on
//! the way back means the group was smaller before it, every "X removed Y"
//! means it was larger.

use crate::models::Message;

/// Number of users named in a membership event
///
/// One name, plus one per comma, plus one for a bare `" and "` when there is
/// no comma ("Ann and Bob"). Names themselves are not validated.
pub fn count_named_users(text: &str) -> i64 {
    let commas = text.chars().filter(|&c| c == ',').count() as i64;
    let mut count = 1 + commas;
    if commas == 0 && text.contains(" and ") {
        count += 1;
    }
    count
}

/// Running member-count estimate for one backward scan
#[derive(Debug, Clone)]
pub struct MembershipTracker {
    count: i64,
    system_sender_name: String,
}

impl MembershipTracker {
    pub fn new(current_member_count: i64, system_sender_name: &str) -> Self {
        Self {
            count: current_member_count,
            system_sender_name: system_sender_name.to_string(),
        }
    }

    /// Estimate for the point in history the scan has reached
    pub fn current(&self) -> i64 {
        self.count
    }

    /// Membership when `message` was posted
    ///
    /// The returned value is read before `message` itself is unwound, so an
    /// add/remove event only affects the messages older than it.
    pub fn visit(&mut self, message: &Message) -> i64 {
        let at_time = self.count;
        self.count += self.delta(message);
        at_time
    }

    /// Change to apply when stepping past `message` into the past
    pub fn delta(&self, message: &Message) -> i64 {
        if message.name != self.system_sender_name {
            return 0;
        }
        let mut delta = 0;
        if message.text.contains("added") {
            delta -= count_named_users(&message.text);
        }
        if message.text.contains("removed") {
            delta += count_named_users(&message.text);
        }
        delta
    }
}

/// Membership at the time of each message, for a newest-first sequence
pub fn membership_timeline<'a, I>(current_member_count: i64, system_sender_name: &str, messages: I) -> Vec<i64>
where
    I: IntoIterator<Item = &'a Message>,
{
    let tracker = MembershipTracker::new(current_member_count, system_sender_name);
    messages
        .into_iter()
        .scan(tracker, |tracker, message| Some(tracker.visit(message)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SenderKind;

    fn system(text: &str) -> Message {
        Message {
            id: "s".to_string(),
            name: "GroupMe".to_string(),
            text: text.to_string(),
            sender_type: SenderKind::System,
            ..Default::default()
        }
    }

    fn chat(name: &str, text: &str) -> Message {
        Message {
            id: "m".to_string(),
            name: name.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_count_named_users() {
        assert_eq!(count_named_users("Alice added"), 1);
        assert_eq!(count_named_users("Alice added Bob to the group."), 1);
        assert_eq!(count_named_users("Alice added Bob and Carol to the group."), 2);
        assert_eq!(count_named_users("Alice, Bob, and Carol added"), 3);
        assert_eq!(count_named_users("Alice added Bob, Carol, Dan, and Eve"), 4);
    }

    #[test]
    fn test_and_only_counts_without_commas() {
        // without a serial comma the last name goes uncounted
        assert_eq!(count_named_users("Ann added Bob, Cy and Di"), 2);
    }

    #[test]
    fn test_visit_reports_count_before_unwinding() {
        let mut tracker = MembershipTracker::new(10, "GroupMe");
        assert_eq!(tracker.visit(&system("Alice removed Dave from the group.")), 10);
        assert_eq!(tracker.current(), 11);
        assert_eq!(tracker.visit(&chat("Bob", "hello")), 11);
        assert_eq!(tracker.visit(&system("Alice added Erin and Finn to the group.")), 11);
        assert_eq!(tracker.visit(&chat("Bob", "older")), 9);
    }

    #[test]
    fn test_only_platform_sender_adjusts() {
        let mut tracker = MembershipTracker::new(6, "GroupMe");
        tracker.visit(&chat("Alice", "I added salt, pepper, and removed the onions"));
        assert_eq!(tracker.current(), 6);
    }

    #[test]
    fn test_added_and_removed_in_one_event() {
        let tracker = MembershipTracker::new(6, "GroupMe");
        // both adjustments apply and cancel out
        assert_eq!(tracker.delta(&system("Alice added Bob and removed Carol")), 0);
    }

    #[test]
    fn test_membership_timeline_follows_visit_order() {
        let messages = vec![
            chat("Bob", "newest"),
            system("Alice added Carol to the group."),
            chat("Bob", "middle"),
            system("Alice removed Dan and Eve from the group."),
            chat("Bob", "oldest"),
        ];
        let timeline = membership_timeline(8, "GroupMe", &messages);
        assert_eq!(timeline, vec![8, 8, 7, 7, 9]);
    }
}
