//! # Jobflow Configuration
//!
//! Typed configuration for the job execution core, loaded from TOML files and
//! environment variables by [`ConfigManager`].
//!
//! ## Sources (later wins)
//!
//! 1. `config/jobflow.toml`
//! 2. `config/jobflow.<environment>.toml`
//! 3. `JOBFLOW__<SECTION>__<KEY>` environment variables
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jobflow_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let period = manager.config().heartbeat.update_period();
//! println!("heartbeat check enabled: {}", period.is_some());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::constants::{channels, commands, system};
use crate::models::TriggerDefinition;
use crate::scheduler::cron::validate_cron_expression;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring jobflow.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JobflowConfig {
    pub database: DatabaseConfig,
    pub heartbeat: HeartbeatConfig,
    pub triggers: TriggersConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/jobflow_development".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

/// Consumer heartbeat settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// How often consumers tick and the check runs; 0 disables the check
    pub update_period_minutes: u64,
    pub notification_channel: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            update_period_minutes: system::DEFAULT_HEARTBEAT_PERIOD_MINUTES,
            notification_channel: channels::MESSAGE_QUEUE_HEARTBEAT.to_string(),
        }
    }
}

impl HeartbeatConfig {
    pub fn is_enabled(&self) -> bool {
        self.update_period_minutes > 0
    }

    /// `None` when the check is disabled
    pub fn update_period(&self) -> Option<Duration> {
        self.is_enabled()
            .then(|| Duration::from_secs(self.update_period_minutes.saturating_mul(60)))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TriggersConfig {
    /// Command the cron scheduler runs for each trigger
    pub command_name: String,
    /// Program line written into the rendered crontab for each schedule
    pub program: String,
    /// Trigger definitions keyed by process name
    pub definitions: BTreeMap<String, Vec<TriggerDefinition>>,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            command_name: commands::HANDLE_TRIGGER.to_string(),
            program: commands::HANDLE_TRIGGER_PROGRAM.to_string(),
            definitions: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Overrides the environment-derived level
    pub level: Option<String>,
}

impl JobflowConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::invalid_value("database.url", "must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "must be greater than zero",
            ));
        }

        if self.heartbeat.update_period_minutes > system::MAX_HEARTBEAT_PERIOD_MINUTES {
            return Err(ConfigurationError::invalid_value(
                "heartbeat.update_period_minutes",
                format!("must be at most {}", system::MAX_HEARTBEAT_PERIOD_MINUTES),
            ));
        }
        validate_channel_name(&self.heartbeat.notification_channel)?;

        if self.triggers.command_name.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "triggers.command_name",
                "must not be empty",
            ));
        }
        if self.triggers.program.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "triggers.program",
                "must not be empty",
            ));
        }
        for (process_name, definitions) in &self.triggers.definitions {
            for definition in definitions {
                if let Some(cron) = &definition.cron {
                    validate_cron_expression(cron).map_err(|e| {
                        ConfigurationError::invalid_value(
                            format!("triggers.definitions.{process_name}"),
                            e.to_string(),
                        )
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Notification channels must be plain identifiers
fn validate_channel_name(channel: &str) -> ConfigResult<()> {
    let valid = !channel.is_empty()
        && channel.len() <= 63
        && channel.starts_with(|c: char| c.is_ascii_lowercase() || c == '_')
        && channel
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigurationError::invalid_value(
            "heartbeat.notification_channel",
            format!("'{channel}' is not a valid channel identifier"),
        ))
    }
}
