//! PostgreSQL job store backed by the `jobflow_jobs` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use super::JobStore;
use crate::constants::status_groups::TERMINAL_STATUSES;
use crate::constants::system::PROGRESS_UNITS_PER_WHOLE;
use crate::error::{JobflowError, Result};
use crate::models::{ChildStatusCounts, Job, NewJob};
use crate::state_machine::JobStatus;

const JOB_COLUMNS: &str = "id, name, status, progress, root_job_id, data, \
                           created_at, started_at, stopped_at, last_active_at";

/// Row shape of `jobflow_jobs`
#[derive(Debug, Clone, FromRow)]
struct JobRow {
    id: i64,
    name: String,
    status: String,
    progress: Option<f64>,
    root_job_id: Option<i64>,
    data: JsonValue,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    stopped_at: Option<DateTime<Utc>>,
    last_active_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = JobflowError;

    fn try_from(row: JobRow) -> Result<Self> {
        let status = row.status.parse::<JobStatus>().map_err(|e| {
            JobflowError::Database(format!("Invalid status in database for job {}: {e}", row.id))
        })?;
        Ok(Job {
            id: row.id,
            name: row.name,
            status,
            progress: row.progress,
            root_job_id: row.root_job_id,
            data: row.data,
            created_at: row.created_at,
            started_at: row.started_at,
            stopped_at: row.stopped_at,
            last_active_at: row.last_active_at,
            child_jobs: None,
        })
    }
}

/// One group of the per-status aggregate read
#[derive(Debug, FromRow)]
struct StatusGroupRow {
    status: String,
    child_count: i64,
    progress_units: i64,
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgJobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgJobStore").field("pool", &"PgPool").finish()
    }
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, new_job: NewJob, root_job_id: Option<i64>) -> Result<Job> {
        let sql = format!(
            "INSERT INTO jobflow_jobs (name, status, root_job_id, data, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(new_job.name)
            .bind(JobStatus::New.as_str())
            .bind(root_job_id)
            .bind(new_job.data)
            .fetch_one(&self.pool)
            .await?;
        Job::try_from(row)
    }
}

/// Terminal status names bound into the progress expression
fn terminal_status_names() -> Vec<String> {
    TERMINAL_STATUSES.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, new_job), fields(name = %new_job.name))]
    async fn create_root_job(&self, new_job: NewJob) -> Result<Job> {
        let job = self.insert(new_job, None).await?;
        debug!(job_id = job.id, "Created root job");
        Ok(job)
    }

    #[instrument(skip(self, new_job), fields(name = %new_job.name))]
    async fn create_child_job(&self, root_job_id: i64, new_job: NewJob) -> Result<Job> {
        let root = self
            .find_job(root_job_id)
            .await?
            .ok_or(JobflowError::JobNotFound(root_job_id))?;
        if !root.is_root() {
            return Err(JobflowError::NotRootJob {
                job_id: root_job_id,
            });
        }
        let job = self.insert(new_job, Some(root_job_id)).await?;
        debug!(job_id = job.id, root_job_id, "Created child job");
        Ok(job)
    }

    async fn find_job(&self, job_id: i64) -> Result<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobflow_jobs WHERE id = $1");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn update_job(&self, job: &Job) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobflow_jobs
            SET status = $2,
                progress = $3,
                started_at = $4,
                stopped_at = $5,
                last_active_at = $6
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(job.status.as_str())
        .bind(job.progress)
        .bind(job.started_at)
        .bind(job.stopped_at)
        .bind(job.last_active_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(JobflowError::JobNotFound(job.id));
        }
        Ok(())
    }

    async fn list_child_jobs(&self, root_job_id: i64) -> Result<Vec<Job>> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobflow_jobs WHERE root_job_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(root_job_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Job::try_from)
            .collect()
    }

    #[instrument(skip(self))]
    async fn child_status_snapshot(&self, root_job_id: i64) -> Result<ChildStatusCounts> {
        // Single statement: all groups come from the same MVCC snapshot.
        // ROUND on a double rounds half to even, matching `progress_units`.
        let rows = sqlx::query_as::<_, StatusGroupRow>(
            r#"
            SELECT status,
                   COUNT(*) AS child_count,
                   COALESCE(SUM(ROUND(
                       COALESCE(
                           progress,
                           CASE WHEN status = ANY($2) THEN 1.0 ELSE 0.0 END
                       )::DOUBLE PRECISION * $3::DOUBLE PRECISION
                   )::BIGINT), 0)::BIGINT AS progress_units
            FROM jobflow_jobs
            WHERE root_job_id = $1
            GROUP BY status
            "#,
        )
        .bind(root_job_id)
        .bind(terminal_status_names())
        .bind(PROGRESS_UNITS_PER_WHOLE as f64)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = ChildStatusCounts::new();
        for row in rows {
            let status = row.status.parse::<JobStatus>().map_err(JobflowError::Database)?;
            let count = u64::try_from(row.child_count).map_err(|_| {
                JobflowError::Database(format!("Negative child count for status {status}"))
            })?;
            let units = u64::try_from(row.progress_units).map_err(|_| {
                JobflowError::Database(format!("Negative progress sum for status {status}"))
            })?;
            counts.record_group(status, count, units);
        }
        Ok(counts)
    }
}
