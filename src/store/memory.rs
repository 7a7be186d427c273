//! In-process job store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::JobStore;
use crate::error::{JobflowError, Result};
use crate::models::{ChildStatusCounts, Job, NewJob};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    jobs: BTreeMap<i64, Job>,
}

/// Job store held in memory. Every read takes a single lock, so a snapshot
/// never mixes counts from different moments.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    state: RwLock<MemoryState>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, new_job: NewJob, root_job_id: Option<i64>) -> Result<Job> {
        let mut state = self.state.write();
        if let Some(root_id) = root_job_id {
            match state.jobs.get(&root_id) {
                None => return Err(JobflowError::JobNotFound(root_id)),
                Some(root) if !root.is_root() => {
                    return Err(JobflowError::NotRootJob { job_id: root_id })
                }
                Some(_) => {}
            }
        }
        state.next_id += 1;
        let job = Job::new(state.next_id, new_job, root_job_id, Utc::now());
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_root_job(&self, new_job: NewJob) -> Result<Job> {
        self.insert(new_job, None)
    }

    async fn create_child_job(&self, root_job_id: i64, new_job: NewJob) -> Result<Job> {
        self.insert(new_job, Some(root_job_id))
    }

    async fn find_job(&self, job_id: i64) -> Result<Option<Job>> {
        Ok(self.state.read().jobs.get(&job_id).cloned())
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let mut state = self.state.write();
        let stored = state
            .jobs
            .get_mut(&job.id)
            .ok_or(JobflowError::JobNotFound(job.id))?;
        stored.status = job.status;
        stored.progress = job.progress;
        stored.started_at = job.started_at;
        stored.stopped_at = job.stopped_at;
        stored.last_active_at = job.last_active_at;
        Ok(())
    }

    async fn list_child_jobs(&self, root_job_id: i64) -> Result<Vec<Job>> {
        let state = self.state.read();
        Ok(state
            .jobs
            .values()
            .filter(|job| job.root_job_id == Some(root_job_id))
            .cloned()
            .collect())
    }

    async fn child_status_snapshot(&self, root_job_id: i64) -> Result<ChildStatusCounts> {
        let state = self.state.read();
        Ok(state
            .jobs
            .values()
            .filter(|job| job.root_job_id == Some(root_job_id))
            .map(|job| (job.status, job.progress))
            .collect())
    }
}
