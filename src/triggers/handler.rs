use async_trait::async_trait;
use serde_json::json;
use sqlx::Postgres;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{NewJob, ProcessData, TransitionTrigger};
use crate::state_machine::JobStatus;

/// Business logic run by a trigger, inside the executor's transaction.
#[async_trait]
pub trait TriggerHandler<Tx: Send>: Send + Sync {
    async fn handle_trigger(
        &self,
        trigger: &TransitionTrigger,
        data: &mut ProcessData,
        tx: &mut Tx,
    ) -> Result<()>;

    /// Called exactly once per attempt, after handling succeeded or failed.
    async fn finish_trigger(&self, trigger: &TransitionTrigger, data: &mut ProcessData) -> Result<()>;
}

/// Root job a trigger enqueues: named `<process>:<trigger id>`, carrying the
/// trigger arguments.
pub fn root_job_request(trigger: &TransitionTrigger) -> NewJob {
    NewJob::named(format!("{}:{}", trigger.process_name, trigger.id)).with_data(json!({
        "process_name": trigger.process_name,
        "trigger_id": trigger.id,
        "arguments": trigger.arguments,
        "queue": trigger.queue,
    }))
}

/// Enqueues a root job for the triggered process in the same transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnqueueRootJobHandler;

impl EnqueueRootJobHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TriggerHandler<sqlx::Transaction<'static, Postgres>> for EnqueueRootJobHandler {
    async fn handle_trigger(
        &self,
        trigger: &TransitionTrigger,
        data: &mut ProcessData,
        tx: &mut sqlx::Transaction<'static, Postgres>,
    ) -> Result<()> {
        let request = root_job_request(trigger);
        let root_job_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO jobflow_jobs (name, status, data, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id
            "#,
        )
        .bind(&request.name)
        .bind(JobStatus::New.as_str())
        .bind(&request.data)
        .fetch_one(&mut **tx)
        .await?;

        data.set("root_job_id", root_job_id)?;
        debug!(trigger_id = trigger.id, root_job_id, "Enqueued root job for trigger");
        Ok(())
    }

    async fn finish_trigger(&self, trigger: &TransitionTrigger, data: &mut ProcessData) -> Result<()> {
        let root_job_id: Option<i64> = data.get("root_job_id")?;
        data.mark_finished();
        info!(
            trigger_id = trigger.id,
            process_name = %trigger.process_name,
            root_job_id = ?root_job_id,
            "Trigger finished"
        );
        Ok(())
    }
}
