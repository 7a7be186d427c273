//! Transactional execution of one trigger.
//!
//! Per attempt the executor walks
//! `Started -> Handling -> Flushing -> Finishing -> Committed | RolledBack`.
//! `Finishing` is reached on the success path and on every failure of
//! handling or flushing, and the finish hook runs exactly once.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

use super::{TriggerHandler, TriggerRepository, UnitOfWork};
use crate::error::{JobflowError, Result};
use crate::logging::log_trigger_operation;
use crate::models::{ProcessData, TransitionTrigger};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Started,
    Handling,
    Flushing,
    Finishing,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct TriggerExecutionReport {
    pub trigger_id: i64,
    pub process_name: String,
    pub phases: Vec<ExecutionPhase>,
    pub elapsed: Duration,
    pub data: ProcessData,
}

/// Parse the raw `--id` value. Anything but a positive integer is `MissingTriggerId`.
pub fn parse_trigger_id(raw: Option<&str>) -> Result<i64> {
    let raw = raw.map(str::trim).unwrap_or_default();
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(JobflowError::MissingTriggerId(raw.to_string())),
    }
}

/// Process exit status for a finished execution
pub fn exit_status(result: &Result<TriggerExecutionReport>) -> i32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

pub struct TriggerExecutor<U, H>
where
    U: UnitOfWork,
    H: TriggerHandler<U::Transaction>,
{
    repository: Arc<dyn TriggerRepository>,
    unit_of_work: U,
    handler: H,
}

impl<U, H> TriggerExecutor<U, H>
where
    U: UnitOfWork,
    H: TriggerHandler<U::Transaction>,
{
    pub fn new(repository: Arc<dyn TriggerRepository>, unit_of_work: U, handler: H) -> Self {
        Self {
            repository,
            unit_of_work,
            handler,
        }
    }

    /// Look up and validate the trigger, then run one transactional attempt.
    ///
    /// Lookup errors are returned before any transaction is opened. Errors
    /// raised while handling, flushing or finishing are returned unchanged
    /// after the rollback.
    #[instrument(skip(self))]
    pub async fn execute(
        &self,
        process_name: &str,
        raw_trigger_id: Option<&str>,
    ) -> Result<TriggerExecutionReport> {
        let trigger = match self.load_trigger(process_name, raw_trigger_id).await {
            Ok(trigger) => trigger,
            Err(error) => {
                error!(process_name = %process_name, error = %error, "Trigger lookup failed");
                return Err(error);
            }
        };
        self.run_attempt(&trigger).await
    }

    async fn load_trigger(
        &self,
        process_name: &str,
        raw_trigger_id: Option<&str>,
    ) -> Result<TransitionTrigger> {
        let trigger_id = parse_trigger_id(raw_trigger_id)?;
        let trigger = self
            .repository
            .find_by_id(trigger_id)
            .await?
            .ok_or(JobflowError::TriggerNotFound(trigger_id))?;

        if trigger.process_name != process_name {
            return Err(JobflowError::TriggerProcessMismatch {
                trigger_id,
                expected: process_name.to_string(),
                actual: trigger.process_name,
            });
        }
        Ok(trigger)
    }

    async fn run_attempt(&self, trigger: &TransitionTrigger) -> Result<TriggerExecutionReport> {
        let started_at = Instant::now();
        let mut phases = vec![ExecutionPhase::Started];
        let mut data = ProcessData::new();
        let mut tx = match self.unit_of_work.begin().await {
            Ok(tx) => tx,
            Err(error) => {
                error!(trigger_id = trigger.id, error = %error, "Could not open trigger transaction");
                return Err(error);
            }
        };

        let body = self
            .handle_and_flush(trigger, &mut data, &mut tx, &mut phases)
            .await;

        // The single place the finish hook runs, whatever the body did
        phases.push(ExecutionPhase::Finishing);
        let finished = self.handler.finish_trigger(trigger, &mut data).await;

        let outcome = match (body, finished) {
            (Err(error), Err(finish_error)) => {
                warn!(
                    trigger_id = trigger.id,
                    error = %finish_error,
                    "Finish hook failed after a handling error"
                );
                Err(error)
            }
            (Err(error), Ok(())) => Err(error),
            (Ok(()), finished) => finished,
        };

        if let Err(error) = outcome {
            if let Err(rollback_error) = self.unit_of_work.rollback(tx).await {
                error!(
                    trigger_id = trigger.id,
                    error = %rollback_error,
                    "Rollback failed"
                );
            }
            return Err(Self::report_failure(trigger, phases, error));
        }

        // A failed COMMIT leaves nothing applied, so it is reported as a rollback
        if let Err(error) = self.unit_of_work.commit(tx).await {
            return Err(Self::report_failure(trigger, phases, error));
        }
        phases.push(ExecutionPhase::Committed);
        let elapsed = started_at.elapsed();

        info!(
            trigger_id = trigger.id,
            process_name = %trigger.process_name,
            elapsed_ms = elapsed.as_millis() as u64,
            "Trigger successfully finished"
        );
        log_trigger_operation(
            "execute",
            trigger.id,
            &trigger.process_name,
            "committed",
            None,
        );

        Ok(TriggerExecutionReport {
            trigger_id: trigger.id,
            process_name: trigger.process_name.clone(),
            phases,
            elapsed,
            data,
        })
    }

    fn report_failure(
        trigger: &TransitionTrigger,
        mut phases: Vec<ExecutionPhase>,
        error: JobflowError,
    ) -> JobflowError {
        phases.push(ExecutionPhase::RolledBack);

        let message = error.to_string();
        error!(
            trigger_id = trigger.id,
            process_name = %trigger.process_name,
            error = %message,
            phases = ?phases,
            "Trigger execution failed"
        );
        log_trigger_operation(
            "execute",
            trigger.id,
            &trigger.process_name,
            "rolled_back",
            Some(&message),
        );
        error
    }

    async fn handle_and_flush(
        &self,
        trigger: &TransitionTrigger,
        data: &mut ProcessData,
        tx: &mut U::Transaction,
        phases: &mut Vec<ExecutionPhase>,
    ) -> Result<()> {
        phases.push(ExecutionPhase::Handling);
        self.handler.handle_trigger(trigger, data, tx).await?;

        phases.push(ExecutionPhase::Flushing);
        self.unit_of_work.flush(tx).await
    }
}
