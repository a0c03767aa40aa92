//! Read-only rollups over a [`Snapshot`] for the dashboard.

use crate::model::{ConfidenceRating, ModuleTopics, Snapshot};

/// Completed vs. total topic counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionSummary {
    pub completed: usize,
    pub total: usize,
}

impl CompletionSummary {
    /// Completed share in `[0, 1]`; an empty catalog reports `0.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Whole-number percentage, rounded down.
    #[must_use]
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }
}

/// Counts of confidence ratings among completed topics. Unset ratings are not
/// counted anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfidenceHistogram {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl ConfidenceHistogram {
    #[must_use]
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

#[must_use]
pub fn compute_completion(snapshot: &Snapshot) -> CompletionSummary {
    snapshot
        .modules
        .values()
        .map(module_completion)
        .fold(CompletionSummary::default(), |acc, m| CompletionSummary {
            completed: acc.completed + m.completed,
            total: acc.total + m.total,
        })
}

#[must_use]
pub fn module_completion(topics: &ModuleTopics) -> CompletionSummary {
    CompletionSummary {
        completed: topics.values().filter(|t| t.done).count(),
        total: topics.len(),
    }
}

#[must_use]
pub fn compute_confidence_histogram(snapshot: &Snapshot) -> ConfidenceHistogram {
    let mut histogram = ConfidenceHistogram::default();
    for topic in snapshot.topics() {
        match topic.effective_confidence() {
            ConfidenceRating::Low => histogram.low += 1,
            ConfidenceRating::Medium => histogram.medium += 1,
            ConfidenceRating::High => histogram.high += 1,
            ConfidenceRating::Unset => {}
        }
    }
    histogram
}
