use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::system::PROGRESS_UNITS_PER_WHOLE;
use crate::state_machine::JobStatus;

/// Aggregated status and progress of a root job
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateStatus {
    pub status: JobStatus,
    /// `None` when the root job has no children
    pub progress: Option<f64>,
}

/// Per-status child counts plus the summed effective progress, taken from
/// one consistent read of a root job's children.
///
/// Progress is summed in fixed-point units (see [`progress_units`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChildStatusCounts {
    counts: HashMap<JobStatus, u64>,
    progress_units: u64,
}

impl ChildStatusCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one child job.
    pub fn record(&mut self, status: JobStatus, progress: Option<f64>) {
        *self.counts.entry(status).or_insert(0) += 1;
        self.progress_units += progress_units(status, progress);
    }

    /// Account for a pre-aggregated group of children, as returned by a
    /// grouped store query. `progress_units` is the group's sum of
    /// [`progress_units`].
    pub fn record_group(&mut self, status: JobStatus, count: u64, progress_units: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(status).or_insert(0) += count;
        self.progress_units += progress_units;
    }

    pub fn count(&self, status: JobStatus) -> u64 {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn progress_units(&self) -> u64 {
        self.progress_units
    }

    pub fn progress_sum(&self) -> f64 {
        self.progress_units as f64 / PROGRESS_UNITS_PER_WHOLE as f64
    }
}

impl FromIterator<(JobStatus, Option<f64>)> for ChildStatusCounts {
    fn from_iter<I: IntoIterator<Item = (JobStatus, Option<f64>)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (status, progress) in iter {
            counts.record(status, progress);
        }
        counts
    }
}

/// Progress a child contributes to the mean.
///
/// Unknown progress counts as done for terminal children and as zero
/// otherwise; every child stays in the denominator.
pub fn effective_progress(status: JobStatus, progress: Option<f64>) -> f64 {
    match progress {
        Some(value) => value,
        None if status.is_terminal() => 1.0,
        None => 0.0,
    }
}

/// Effective progress in fixed-point units, rounding half to even.
///
/// `PgJobStore` computes the same value in SQL with `ROUND` on a double,
/// which also rounds half to even.
pub fn progress_units(status: JobStatus, progress: Option<f64>) -> u64 {
    let scaled = effective_progress(status, progress) * PROGRESS_UNITS_PER_WHOLE as f64;
    scaled.round_ties_even().max(0.0) as u64
}
