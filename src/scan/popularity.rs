//! Popularity threshold for a message given the group size when it was posted

use serde::Deserialize;
use serde::Serialize;

/// Step function from group size to the number of likes a message needs
///
/// * up to `small_group_max` members: everyone but one
/// * `large_group_min` members or more: `large_group_endorsers`
/// * in between: `mid_base_endorsers + (members - small_group_max) / mid_step`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularityThresholds {
    pub small_group_max: i64,
    pub large_group_min: i64,
    pub large_group_endorsers: i64,
    pub mid_base_endorsers: i64,
    pub mid_step: i64,
}

impl Default for PopularityThresholds {
    fn default() -> Self {
        Self {
            small_group_max: 5,
            large_group_min: 17,
            large_group_endorsers: 8,
            mid_base_endorsers: 4,
            mid_step: 3,
        }
    }
}

impl PopularityThresholds {
    /// Likes required at the given membership
    pub fn required_endorsers(&self, membership: i64) -> i64 {
        if membership <= self.small_group_max {
            membership - 1
        } else if membership >= self.large_group_min {
            self.large_group_endorsers
        } else {
            // membership > small_group_max here, so the division floors
            self.mid_base_endorsers + (membership - self.small_group_max) / self.mid_step.max(1)
        }
    }
}

/// Decides whether a message cleared the bar for its group size
#[derive(Debug, Clone)]
pub struct PopularityClassifier {
    thresholds: PopularityThresholds,
    excluded_phrase: String,
}

impl PopularityClassifier {
    pub fn new(thresholds: PopularityThresholds, excluded_phrase: &str) -> Self {
        Self {
            thresholds,
            excluded_phrase: excluded_phrase.to_lowercase(),
        }
    }

    pub fn thresholds(&self) -> &PopularityThresholds {
        &self.thresholds
    }

    /// "Like this if ..." ballots collect likes by asking for them
    pub fn is_ballot(&self, text: &str) -> bool {
        !self.excluded_phrase.is_empty() && text.to_lowercase().contains(&self.excluded_phrase)
    }

    pub fn is_popular(&self, text: &str, endorsers: usize, membership: i64) -> bool {
        if self.is_ballot(text) {
            return false;
        }
        endorsers as i64 >= self.thresholds.required_endorsers(membership)
    }
}

impl Default for PopularityClassifier {
    fn default() -> Self {
        Self::new(PopularityThresholds::default(), "like this")
    }
}
