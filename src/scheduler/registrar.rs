use std::sync::Arc;
use tracing::{info, instrument};

use super::{validate_cron_expression, ArgumentProvider, CronScheduler, ScheduleEntry};
use crate::config::TriggersConfig;
use crate::error::Result;
use crate::models::{TransitionTrigger, TriggerDefinition};
use crate::triggers::TriggerRepository;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebuildSummary {
    pub process_name: String,
    pub removed: usize,
    pub stored: Vec<TransitionTrigger>,
    pub scheduled: usize,
}

/// Reloads the triggers of a process from a configuration snapshot and keeps
/// the cron scheduler in step with them.
pub struct TriggerScheduleRegistrar {
    repository: Arc<dyn TriggerRepository>,
    scheduler: Arc<dyn CronScheduler>,
    command_name: String,
}

impl TriggerScheduleRegistrar {
    pub fn new(
        repository: Arc<dyn TriggerRepository>,
        scheduler: Arc<dyn CronScheduler>,
        command_name: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            scheduler,
            command_name: command_name.into(),
        }
    }

    /// Clear and reload the triggers of `process_name`.
    ///
    /// Every cron expression is validated before anything is touched.
    #[instrument(skip(self, definitions), fields(count = definitions.len()))]
    pub async fn rebuild(
        &self,
        process_name: &str,
        definitions: Vec<TriggerDefinition>,
    ) -> Result<RebuildSummary> {
        for cron in definitions.iter().filter_map(|d| d.cron.as_deref()) {
            validate_cron_expression(cron)?;
        }

        let previous = self.repository.find_by_process(process_name).await?;
        let stored = self
            .repository
            .replace_for_process(process_name, definitions)
            .await?;

        let mut removed = 0;
        for trigger in previous.iter().filter(|t| t.is_scheduled()) {
            if self
                .scheduler
                .deregister(&self.command_name, &trigger.command_arguments())
                .await?
            {
                removed += 1;
            }
        }

        let mut scheduled = 0;
        for trigger in stored.iter() {
            if let Some(entry) = self.schedule_entry(trigger) {
                self.scheduler.register(entry).await?;
                scheduled += 1;
            }
        }

        info!(
            process_name = %process_name,
            removed,
            stored = stored.len(),
            scheduled,
            "Rebuilt process trigger schedules"
        );

        Ok(RebuildSummary {
            process_name: process_name.to_string(),
            removed,
            stored,
            scheduled,
        })
    }

    /// Register the stored triggers of `process_name` as they are, without
    /// reloading them. Returns how many were scheduled.
    pub async fn schedule_stored(&self, process_name: &str) -> Result<usize> {
        let mut scheduled = 0;
        for trigger in self.repository.find_by_process(process_name).await? {
            if let Some(entry) = self.schedule_entry(&trigger) {
                self.scheduler.register(entry).await?;
                scheduled += 1;
            }
        }
        Ok(scheduled)
    }

    /// Rebuild every process named in the configuration snapshot.
    pub async fn rebuild_all(&self, config: &TriggersConfig) -> Result<Vec<RebuildSummary>> {
        let mut summaries = Vec::with_capacity(config.definitions.len());
        for (process_name, definitions) in &config.definitions {
            summaries.push(self.rebuild(process_name, definitions.clone()).await?);
        }
        Ok(summaries)
    }

    fn schedule_entry(&self, trigger: &TransitionTrigger) -> Option<ScheduleEntry> {
        let cron = trigger.cron.clone()?;
        let trigger = trigger.clone();
        let arguments: ArgumentProvider = Arc::new(move || trigger.command_arguments());
        Some(ScheduleEntry::new(self.command_name.clone(), arguments, cron))
    }
}
