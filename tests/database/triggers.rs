//! Trigger storage and transactional execution on PostgreSQL.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use jobflow_core::models::{ProcessData, TransitionTrigger, TriggerDefinition};
use jobflow_core::triggers::{
    EnqueueRootJobHandler, ExecutionPhase, PgTriggerRepository, PgUnitOfWork, TriggerExecutor,
    TriggerHandler, TriggerRepository,
};
use jobflow_core::{JobflowError, Result};

async fn root_jobs_named(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM jobflow_jobs WHERE name = $1 AND root_job_id IS NULL")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Enqueues the root job, then rejects the trigger
struct RejectingHandler;

#[async_trait]
impl TriggerHandler<Transaction<'static, Postgres>> for RejectingHandler {
    async fn handle_trigger(
        &self,
        trigger: &TransitionTrigger,
        data: &mut ProcessData,
        tx: &mut Transaction<'static, Postgres>,
    ) -> Result<()> {
        EnqueueRootJobHandler::new()
            .handle_trigger(trigger, data, tx)
            .await?;
        Err(JobflowError::Handler("rejected".to_string()))
    }

    async fn finish_trigger(&self, trigger: &TransitionTrigger, data: &mut ProcessData) -> Result<()> {
        EnqueueRootJobHandler::new().finish_trigger(trigger, data).await
    }
}

#[sqlx::test(migrator = "jobflow_core::database::MIGRATOR")]
async fn test_replace_for_process_swaps_triggers(pool: PgPool) {
    let repository = PgTriggerRepository::new(pool);

    let first = repository
        .replace_for_process(
            "demo_process",
            vec![
                TriggerDefinition::cron("*/5 * * * *")
                    .with_arguments(vec!["--batch=10".to_string()]),
                TriggerDefinition::default(),
            ],
        )
        .await
        .unwrap();
    repository
        .replace_for_process("other_process", vec![TriggerDefinition::cron("@daily")])
        .await
        .unwrap();

    assert_eq!(first.len(), 2);
    let found = repository.find_by_id(first[0].id).await.unwrap().unwrap();
    assert_eq!(found.cron.as_deref(), Some("*/5 * * * *"));
    assert_eq!(found.arguments, vec!["--batch=10".to_string()]);

    let second = repository
        .replace_for_process("demo_process", vec![TriggerDefinition::cron("@hourly")])
        .await
        .unwrap();

    assert!(repository.find_by_id(first[0].id).await.unwrap().is_none());
    let current = repository.find_by_process("demo_process").await.unwrap();
    assert_eq!(current, second);
    assert_eq!(repository.find_by_process("other_process").await.unwrap().len(), 1);
}

#[sqlx::test(migrator = "jobflow_core::database::MIGRATOR")]
async fn test_committed_trigger_enqueues_root_job(pool: PgPool) {
    let repository = Arc::new(PgTriggerRepository::new(pool.clone()));
    let stored = repository
        .replace_for_process("demo_process", vec![TriggerDefinition::cron("@hourly")])
        .await
        .unwrap();
    let trigger_id = stored[0].id;

    let executor = TriggerExecutor::new(
        repository,
        PgUnitOfWork::new(pool.clone()),
        EnqueueRootJobHandler::new(),
    );
    let report = executor
        .execute("demo_process", Some(&trigger_id.to_string()))
        .await
        .unwrap();

    assert_eq!(report.phases.last(), Some(&ExecutionPhase::Committed));
    let root_job_id: Option<i64> = report.data.get("root_job_id").unwrap();
    assert!(root_job_id.is_some());
    assert_eq!(
        root_jobs_named(&pool, &format!("demo_process:{trigger_id}")).await,
        1
    );
}

#[sqlx::test(migrator = "jobflow_core::database::MIGRATOR")]
async fn test_rejected_trigger_rolls_back_its_writes(pool: PgPool) {
    let repository = Arc::new(PgTriggerRepository::new(pool.clone()));
    let stored = repository
        .replace_for_process("demo_process", vec![TriggerDefinition::cron("@hourly")])
        .await
        .unwrap();
    let trigger_id = stored[0].id;

    let executor = TriggerExecutor::new(repository, PgUnitOfWork::new(pool.clone()), RejectingHandler);
    let error = executor
        .execute("demo_process", Some(&trigger_id.to_string()))
        .await
        .unwrap_err();

    assert_eq!(error, JobflowError::Handler("rejected".to_string()));
    assert_eq!(
        root_jobs_named(&pool, &format!("demo_process:{trigger_id}")).await,
        0
    );
}
