//! # Cron Schedule Registration
//!
//! Triggers register themselves against an external deferred scheduler as a
//! `(command, arguments, cron)` tuple. Arguments are produced lazily so the
//! scheduler only materialises them when it needs them.

pub mod cron;
pub mod crontab;
pub mod registrar;

use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

pub use cron::validate_cron_expression;
pub use crontab::{crontab_line, render_crontab};
pub use registrar::{RebuildSummary, TriggerScheduleRegistrar};

/// Lazily produces the CLI arguments of a scheduled command
pub type ArgumentProvider = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

#[derive(Clone)]
pub struct ScheduleEntry {
    pub command: String,
    pub arguments: ArgumentProvider,
    pub cron: String,
}

impl ScheduleEntry {
    pub fn new(command: impl Into<String>, arguments: ArgumentProvider, cron: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments,
            cron: cron.into(),
        }
    }

    pub fn arguments(&self) -> Vec<String> {
        (self.arguments)()
    }
}

impl fmt::Debug for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleEntry")
            .field("command", &self.command)
            .field("arguments", &self.arguments())
            .field("cron", &self.cron)
            .finish()
    }
}

/// Deferred cron scheduler the triggers register against
#[async_trait]
pub trait CronScheduler: Send + Sync {
    /// Register or replace the schedule for `(command, arguments)`.
    async fn register(&self, entry: ScheduleEntry) -> Result<()>;

    /// Returns whether a schedule was removed.
    async fn deregister(&self, command: &str, arguments: &[String]) -> Result<bool>;

    async fn entries(&self) -> Result<Vec<ScheduleEntry>>;
}

type ScheduleKey = (String, Vec<String>);

/// Scheduler keeping its entries in a concurrent map
#[derive(Default)]
pub struct InMemoryCronScheduler {
    entries: DashMap<ScheduleKey, ScheduleEntry>,
}

impl InMemoryCronScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CronScheduler for InMemoryCronScheduler {
    async fn register(&self, entry: ScheduleEntry) -> Result<()> {
        validate_cron_expression(&entry.cron)?;
        let key = (entry.command.clone(), entry.arguments());
        debug!(command = %key.0, arguments = ?key.1, cron = %entry.cron, "Registered schedule");
        self.entries.insert(key, entry);
        Ok(())
    }

    async fn deregister(&self, command: &str, arguments: &[String]) -> Result<bool> {
        let removed = self
            .entries
            .remove(&(command.to_string(), arguments.to_vec()))
            .is_some();
        debug!(command = %command, arguments = ?arguments, removed, "Deregistered schedule");
        Ok(removed)
    }

    async fn entries(&self) -> Result<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> =
            self.entries.iter().map(|entry| entry.value().clone()).collect();
        entries.sort_by_key(|entry| (entry.command.clone(), entry.arguments()));
        Ok(entries)
    }
}
