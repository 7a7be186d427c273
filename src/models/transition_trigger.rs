use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled transition of a process definition.
///
/// Triggers are created by the schedule rebuild and only read at execution
/// time; the executor drives a separate [`ProcessData`](super::ProcessData).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionTrigger {
    pub id: i64,
    pub process_name: String,
    pub cron: Option<String>,
    pub arguments: Vec<String>,
    pub queue: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trigger as declared in configuration, before it is stored and given an id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    #[serde(default)]
    pub cron: Option<String>,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub queue: Option<String>,
}

impl TriggerDefinition {
    pub fn cron(expression: impl Into<String>) -> Self {
        Self {
            cron: Some(expression.into()),
            ..Self::default()
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }
}

impl TransitionTrigger {
    pub fn from_definition(
        id: i64,
        process_name: &str,
        definition: TriggerDefinition,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            process_name: process_name.to_string(),
            cron: definition.cron,
            arguments: definition.arguments,
            queue: definition.queue,
            created_at: now,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.cron.is_some()
    }

    /// CLI arguments the cron scheduler passes to the trigger command
    pub fn command_arguments(&self) -> Vec<String> {
        vec![self.process_name.clone(), format!("--id={}", self.id)]
    }
}
