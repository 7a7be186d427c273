//! Recording test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jobflow_core::heartbeat::{
    BrokerConnectivityProbe, ConsumerLivenessProbe, NotificationPublisher,
};
use jobflow_core::models::{ProcessData, TransitionTrigger, TriggerDefinition};
use jobflow_core::triggers::{TriggerHandler, UnitOfWork};
use jobflow_core::{JobflowError, Result};

/// Ordered record of calls made against the doubles of one test
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().iter().filter(|c| c.as_str() == call).count()
    }
}

pub fn trigger(id: i64, process_name: &str) -> TransitionTrigger {
    TransitionTrigger::from_definition(
        id,
        process_name,
        TriggerDefinition::cron("*/5 * * * *"),
        Utc::now(),
    )
}

/// Transaction handed out by [`RecordingUnitOfWork`]
#[derive(Debug, Default)]
pub struct RecordingTransaction {
    pub writes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingUnitOfWork {
    pub log: CallLog,
    pub fail_flush: bool,
    pub fail_commit: bool,
    pub committed_writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingUnitOfWork {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn failing_flush(log: CallLog) -> Self {
        Self {
            log,
            fail_flush: true,
            ..Self::default()
        }
    }

    pub fn failing_commit(log: CallLog) -> Self {
        Self {
            log,
            fail_commit: true,
            ..Self::default()
        }
    }

    pub fn committed_writes(&self) -> Vec<String> {
        self.committed_writes.lock().clone()
    }
}

#[async_trait]
impl UnitOfWork for RecordingUnitOfWork {
    type Transaction = RecordingTransaction;

    async fn begin(&self) -> Result<RecordingTransaction> {
        self.log.push("begin");
        Ok(RecordingTransaction::default())
    }

    async fn flush(&self, _tx: &mut RecordingTransaction) -> Result<()> {
        self.log.push("flush");
        if self.fail_flush {
            return Err(JobflowError::Database("deferred constraint violated".to_string()));
        }
        Ok(())
    }

    async fn commit(&self, tx: RecordingTransaction) -> Result<()> {
        self.log.push("commit");
        if self.fail_commit {
            return Err(JobflowError::Database("could not serialize access".to_string()));
        }
        self.committed_writes.lock().extend(tx.writes);
        Ok(())
    }

    async fn rollback(&self, _tx: RecordingTransaction) -> Result<()> {
        self.log.push("rollback");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    pub log: CallLog,
    pub fail_handle: bool,
    pub fail_finish: bool,
}

impl RecordingHandler {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self {
            log,
            fail_handle: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TriggerHandler<RecordingTransaction> for RecordingHandler {
    async fn handle_trigger(
        &self,
        trigger: &TransitionTrigger,
        data: &mut ProcessData,
        tx: &mut RecordingTransaction,
    ) -> Result<()> {
        self.log.push("handle");
        tx.writes.push(format!("{}:{}", trigger.process_name, trigger.id));
        data.set("handled", true)?;
        if self.fail_handle {
            return Err(JobflowError::Handler("business rule violated".to_string()));
        }
        Ok(())
    }

    async fn finish_trigger(&self, _trigger: &TransitionTrigger, data: &mut ProcessData) -> Result<()> {
        self.log.push("finish");
        data.mark_finished();
        if self.fail_finish {
            return Err(JobflowError::Handler("finish hook failed".to_string()));
        }
        Ok(())
    }
}

/// Liveness probe with a fixed answer that counts how often it is asked
#[derive(Debug, Default)]
pub struct FixedLiveness {
    pub alive: bool,
    pub calls: AtomicUsize,
}

impl FixedLiveness {
    pub fn new(alive: bool) -> Arc<Self> {
        Arc::new(Self {
            alive,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsumerLivenessProbe for FixedLiveness {
    async fn is_alive(&self) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.alive)
    }
}

#[derive(Debug, Default)]
pub struct FixedConnectivity {
    pub reachable: bool,
    pub calls: AtomicUsize,
}

impl FixedConnectivity {
    pub fn new(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnectivityProbe for FixedConnectivity {
    async fn is_reachable(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<(String, JsonValue)>>,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn published(&self) -> Vec<(String, JsonValue)> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, channel: &str, payload: &JsonValue) -> Result<()> {
        self.published
            .lock()
            .push((channel.to_string(), payload.clone()));
        Ok(())
    }
}
