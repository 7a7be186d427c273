use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::error::{JobflowError, Result};
use crate::models::ChildStatusCounts;
use crate::state_machine::JobStatus;
use crate::store::JobStore;

/// A unit of asynchronous work. Root jobs have `root_job_id == None` and
/// expose their children through `child_jobs`; child jobs point at exactly
/// one root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub name: String,
    pub status: JobStatus,
    /// Fraction of completion in `0.0..=1.0`, `None` when unknown
    pub progress: Option<f64>,
    pub root_job_id: Option<i64>,
    pub data: JsonValue,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub child_jobs: Option<ChildJobView>,
}

/// New Job for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub name: String,
    pub data: JsonValue,
}

impl NewJob {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: JsonValue::Object(serde_json::Map::new()),
        }
    }

    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }
}

impl Job {
    pub fn new(id: i64, new_job: NewJob, root_job_id: Option<i64>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new_job.name,
            status: JobStatus::New,
            progress: None,
            root_job_id,
            data: new_job.data,
            created_at: now,
            started_at: None,
            stopped_at: None,
            last_active_at: None,
            child_jobs: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.root_job_id.is_none()
    }

    /// Set reported progress, rejecting values outside `0.0..=1.0`.
    pub fn set_progress(&mut self, progress: Option<f64>) -> Result<()> {
        self.progress = progress.map(validate_progress).transpose()?;
        Ok(())
    }

    pub fn with_child_jobs(mut self, view: ChildJobView) -> Self {
        self.child_jobs = Some(view);
        self
    }
}

pub fn validate_progress(progress: f64) -> Result<f64> {
    if progress.is_nan() || !(0.0..=1.0).contains(&progress) {
        return Err(JobflowError::Validation(format!(
            "Job progress must be within 0.0..=1.0, got {progress}"
        )));
    }
    Ok(progress)
}

/// How a root job's children are exposed.
///
/// The variant decides which status calculator may be used: a materialized
/// list is iterated in memory, a query handle is aggregated by the store.
#[derive(Clone)]
pub enum ChildJobView {
    /// All children loaded and stable for the duration of a calculation
    Materialized(Vec<Job>),
    /// Live handle over the persistent child-job query
    Query(ChildJobQuery),
}

impl ChildJobView {
    /// Readable representation name, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Materialized(_) => "materialized",
            Self::Query(_) => "query",
        }
    }
}

impl fmt::Debug for ChildJobView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Materialized(jobs) => f.debug_tuple("Materialized").field(&jobs.len()).finish(),
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
        }
    }
}

/// Child jobs of one root, resolved by aggregate queries against the store
#[derive(Clone)]
pub struct ChildJobQuery {
    root_job_id: i64,
    store: Arc<dyn JobStore>,
}

impl ChildJobQuery {
    pub fn new(root_job_id: i64, store: Arc<dyn JobStore>) -> Self {
        Self { root_job_id, store }
    }

    pub fn root_job_id(&self) -> i64 {
        self.root_job_id
    }

    /// One grouped read of per-status counts and progress
    pub async fn snapshot(&self) -> Result<ChildStatusCounts> {
        self.store.child_status_snapshot(self.root_job_id).await
    }
}

impl fmt::Debug for ChildJobQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildJobQuery")
            .field("root_job_id", &self.root_job_id)
            .field("store", &"JobStore")
            .finish()
    }
}
