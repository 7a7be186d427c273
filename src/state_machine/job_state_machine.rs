use chrono::{DateTime, Utc};
use tracing::debug;

use super::states::JobStatus;
use crate::error::{JobflowError, Result};
use crate::models::Job;

/// Applies a status change to a job, enforcing the transition table and
/// maintaining the lifecycle timestamps.
pub struct JobStateMachine;

impl JobStateMachine {
    /// Validate `to` against the job's current status and stamp the timestamps.
    pub fn transition(job: &mut Job, to: JobStatus, now: DateTime<Utc>) -> Result<()> {
        let from = job.status;
        if !from.can_transition_to(to) {
            return Err(JobflowError::InvalidStatusTransition {
                job_id: job.id,
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if to == JobStatus::Running && job.started_at.is_none() {
            job.started_at = Some(now);
        }
        if to.is_terminal() {
            job.stopped_at = Some(now);
        }
        job.last_active_at = Some(now);
        job.status = to;

        debug!(job_id = job.id, from = %from, to = %to, "Job status transitioned");
        Ok(())
    }
}
