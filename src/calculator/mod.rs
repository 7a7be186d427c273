//! # Root Job Status Calculation
//!
//! Rolls the statuses and progress of a root job's children up into the root
//! job. Two calculators exist, one per [`ChildJobView`] representation:
//!
//! - [`CollectionStatusCalculator`] iterates children already in memory
//! - [`QueryStatusCalculator`] asks the store for one grouped aggregate
//!
//! Both reduce their input to a [`ChildStatusCounts`] snapshot and hand it to
//! [`aggregate`], so the precedence rule and the progress formula exist
//! exactly once.
//!
//! ## Precedence
//!
//! 1. no children: `New`, progress unknown
//! 2. any `Failed`: `Failed`
//! 3. any `Running` or `FailedRedelivered`: `Running`
//! 4. only `New`: `New`
//! 5. `New` mixed with finished children: `Running`
//! 6. all finished: `Cancelled` if any cancelled, else `Stale` if any stale,
//!    else `Success`
//!
//! Progress is the mean of every child's effective progress (see
//! [`effective_progress`](crate::models::effective_progress)) rounded to four
//! decimal places.
//!
//! [`ChildJobView`]: crate::models::ChildJobView

pub mod collection;
pub mod query;
pub mod resolver;
pub mod root_job_updater;

use async_trait::async_trait;

use crate::constants::system::PROGRESS_PRECISION;
use crate::error::Result;
use crate::models::{AggregateStatus, ChildStatusCounts, Job};
use crate::state_machine::JobStatus;

pub use collection::CollectionStatusCalculator;
pub use query::QueryStatusCalculator;
pub use resolver::StatusCalculatorResolver;
pub use root_job_updater::{RootJobStatusUpdater, RootJobUpdate};

/// Computes the aggregate status and progress of a root job
#[async_trait]
pub trait StatusCalculator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn calculate(&self, root_job: &Job) -> Result<AggregateStatus>;
}

/// Pure roll-up of one children snapshot.
pub fn aggregate(counts: &ChildStatusCounts) -> AggregateStatus {
    let total = counts.total();
    if total == 0 {
        return AggregateStatus {
            status: JobStatus::New,
            progress: None,
        };
    }

    AggregateStatus {
        status: root_status(counts, total),
        progress: Some(round_progress(counts.progress_sum() / total as f64)),
    }
}

fn root_status(counts: &ChildStatusCounts, total: u64) -> JobStatus {
    let new = counts.count(JobStatus::New);

    if counts.count(JobStatus::Failed) > 0 {
        JobStatus::Failed
    } else if counts.count(JobStatus::Running) > 0 || counts.count(JobStatus::FailedRedelivered) > 0
    {
        JobStatus::Running
    } else if new == total {
        JobStatus::New
    } else if new > 0 {
        JobStatus::Running
    } else if counts.count(JobStatus::Cancelled) > 0 {
        JobStatus::Cancelled
    } else if counts.count(JobStatus::Stale) > 0 {
        JobStatus::Stale
    } else {
        JobStatus::Success
    }
}

fn round_progress(progress: f64) -> f64 {
    let factor = 10f64.powi(PROGRESS_PRECISION);
    ((progress * factor).round() / factor).clamp(0.0, 1.0)
}
