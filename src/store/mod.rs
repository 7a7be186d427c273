//! # Job Store
//!
//! Persistence boundary for root and child jobs. The status calculators only
//! ever need two things from it: the fully loaded children of a root job, or a
//! grouped aggregate read over them.
//!
//! Two backends are provided:
//!
//! - [`MemoryJobStore`]: lock-protected in-process storage
//! - [`PgJobStore`]: PostgreSQL through sqlx

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{JobflowError, Result};
use crate::models::{ChildJobQuery, ChildJobView, ChildStatusCounts, Job, NewJob};

pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_root_job(&self, new_job: NewJob) -> Result<Job>;

    /// Fails with `JobNotFound` / `NotRootJob` when `root_job_id` is not a root.
    async fn create_child_job(&self, root_job_id: i64, new_job: NewJob) -> Result<Job>;

    /// Returned jobs never carry a child view.
    async fn find_job(&self, job_id: i64) -> Result<Option<Job>>;

    /// Persist status, progress and lifecycle timestamps.
    async fn update_job(&self, job: &Job) -> Result<()>;

    /// Children of a root job ordered by id.
    async fn list_child_jobs(&self, root_job_id: i64) -> Result<Vec<Job>>;

    /// Per-status counts and progress of the children, read in one statement.
    async fn child_status_snapshot(&self, root_job_id: i64) -> Result<ChildStatusCounts>;
}

/// Load a root job whose children are exposed as a live query handle.
pub async fn find_root_with_query_view(store: &Arc<dyn JobStore>, root_job_id: i64) -> Result<Job> {
    let root = require_root(store.as_ref(), root_job_id).await?;
    let query = ChildJobQuery::new(root_job_id, Arc::clone(store));
    Ok(root.with_child_jobs(ChildJobView::Query(query)))
}

/// Load a root job together with all of its children.
pub async fn find_root_with_materialized_view(store: &dyn JobStore, root_job_id: i64) -> Result<Job> {
    let root = require_root(store, root_job_id).await?;
    let children = store.list_child_jobs(root_job_id).await?;
    Ok(root.with_child_jobs(ChildJobView::Materialized(children)))
}

async fn require_root(store: &dyn JobStore, job_id: i64) -> Result<Job> {
    let job = store
        .find_job(job_id)
        .await?
        .ok_or(JobflowError::JobNotFound(job_id))?;
    if !job.is_root() {
        return Err(JobflowError::NotRootJob { job_id });
    }
    Ok(job)
}
