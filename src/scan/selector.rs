//! Weighted random pick among the day's candidates

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::aggregator::Candidate;

/// Picks a candidate with probability proportional to its score
///
/// Favors the best-liked message without always choosing it.
pub struct MessageSelector<R: Rng = StdRng> {
    rng: R,
}

impl MessageSelector<StdRng> {
    /// Seeded from the operating system; differs on every run
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible draws
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MessageSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// `None` when there is nothing to choose from
    pub fn select(&mut self, mut candidates: Vec<Candidate>) -> Option<Candidate> {
        if candidates.is_empty() {
            return None;
        }

        // stable, so equal scores keep their scan order
        candidates.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));

        let total: f64 = candidates.iter().map(Candidate::score).sum();
        let draw = self.rng.random::<f64>() * total;
        let index = pick_index(&candidates, draw);

        tracing::debug!(
            candidates = candidates.len(),
            total,
            draw,
            index,
            "weighted draw"
        );
        Some(candidates.swap_remove(index))
    }
}

/// Walk the sorted candidates subtracting scores until the draw is used up
///
/// Falls back to the first (best) candidate if rounding leaves the draw
/// positive after the last one.
fn pick_index(sorted: &[Candidate], mut draw: f64) -> usize {
    for (index, candidate) in sorted.iter().enumerate() {
        draw -= candidate.score();
        if draw <= 0.0 {
            return index;
        }
    }
    0
}
