use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::StatusCalculatorResolver;
use crate::error::{JobflowError, Result};
use crate::logging::log_job_operation;
use crate::models::AggregateStatus;
use crate::state_machine::{JobStateMachine, JobStatus};
use crate::store::{find_root_with_query_view, JobStore};

/// Outcome of a root job recalculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootJobUpdate {
    pub root_job_id: i64,
    pub previous: AggregateStatus,
    pub current: AggregateStatus,
}

impl RootJobUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Keeps a root job's status in line with its children.
///
/// Every child status change is followed by a fresh aggregation. Concurrent
/// workers may race; the last aggregation written wins and the next child
/// change corrects any stale result.
pub struct RootJobStatusUpdater {
    store: Arc<dyn JobStore>,
    resolver: StatusCalculatorResolver,
}

impl RootJobStatusUpdater {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            resolver: StatusCalculatorResolver::new(),
        }
    }

    /// Apply a consumer-reported status (and optional progress) to a child
    /// job, then recalculate its root.
    #[instrument(skip(self))]
    pub async fn apply_child_status(
        &self,
        child_job_id: i64,
        status: JobStatus,
        progress: Option<f64>,
    ) -> Result<RootJobUpdate> {
        let mut child = self
            .store
            .find_job(child_job_id)
            .await?
            .ok_or(JobflowError::JobNotFound(child_job_id))?;
        let root_job_id = child.root_job_id.ok_or_else(|| {
            JobflowError::Validation(format!("Job {child_job_id} is a root job, not a child job"))
        })?;

        if progress.is_some() {
            child.set_progress(progress)?;
        }
        if child.status != status {
            JobStateMachine::transition(&mut child, status, Utc::now())?;
        }
        self.store.update_job(&child).await?;

        log_job_operation("child_status_applied", child.id, Some(root_job_id), status, None);
        self.recalculate_root(root_job_id).await
    }

    /// Recompute and persist the aggregate of one root job.
    #[instrument(skip(self))]
    pub async fn recalculate_root(&self, root_job_id: i64) -> Result<RootJobUpdate> {
        let mut root = find_root_with_query_view(&self.store, root_job_id).await?;
        let previous = AggregateStatus {
            status: root.status,
            progress: root.progress,
        };
        let current = self.resolver.calculate(&root).await?;
        let update = RootJobUpdate {
            root_job_id,
            previous,
            current,
        };

        if !update.changed() {
            return Ok(update);
        }

        // Root status is derived from the children, not transitioned
        let now = Utc::now();
        root.status = current.status;
        root.progress = current.progress;
        root.last_active_at = Some(now);
        if current.status != JobStatus::New && root.started_at.is_none() {
            root.started_at = Some(now);
        }
        root.stopped_at = current.status.is_terminal().then_some(now);
        self.store.update_job(&root).await?;

        info!(
            root_job_id,
            from = %previous.status,
            to = %current.status,
            progress = ?current.progress,
            "Root job aggregate updated"
        );
        Ok(update)
    }
}
