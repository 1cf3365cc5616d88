use chrono::NaiveDate;
use tracing::debug;

use crate::config::RunConfig;
use crate::models::Candidate;

/// Drops candidates dated before the recency cutoff before they reach the
/// merge step. Candidates on or after the cutoff pass untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyFilter {
    cutoff: NaiveDate,
}

impl RecencyFilter {
    pub fn new(cutoff: NaiveDate) -> Self {
        Self { cutoff }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.recent_cutoff())
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    pub fn admits(&self, candidate: &Candidate) -> bool {
        candidate.date().is_some_and(|date| date >= self.cutoff)
    }

    /// Keep admitted candidates in order; returns them with the drop count.
    pub fn apply(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, usize) {
        let before = candidates.len();
        let kept: Vec<Candidate> = candidates.into_iter().filter(|c| self.admits(c)).collect();
        let dropped = before - kept.len();

        if dropped > 0 {
            debug!("Filtered {} candidates before {}", dropped, self.cutoff);
        }
        (kept, dropped)
    }
}
