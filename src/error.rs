//! Error types for the job execution core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobflowError {
    /// The `--id` argument was absent or not an integer
    #[error("Missing trigger id: {0:?} is not a valid trigger identifier")]
    MissingTriggerId(String),

    #[error("Trigger {0} not found")]
    TriggerNotFound(i64),

    #[error("Trigger {trigger_id} belongs to process '{actual}', expected '{expected}'")]
    TriggerProcessMismatch {
        trigger_id: i64,
        expected: String,
        actual: String,
    },

    /// Carries the runtime type name of the child collection that was seen
    #[error("Unsupported child job collection type: {type_name}")]
    UnsupportedCollectionType { type_name: String },

    #[error("Job {0} not found")]
    JobNotFound(i64),

    #[error("Job {job_id} is not a root job")]
    NotRootJob { job_id: i64 },

    #[error("Invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidStatusTransition {
        job_id: i64,
        from: String,
        to: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Trigger handler error: {0}")]
    Handler(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl JobflowError {
    /// Errors detected before any transaction is opened.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTriggerId(_)
                | Self::TriggerNotFound(_)
                | Self::TriggerProcessMismatch { .. }
        )
    }

    /// Transient transport failures. Everything else points at bad input or a code defect.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Notification(_))
    }
}

impl From<sqlx::Error> for JobflowError {
    fn from(err: sqlx::Error) -> Self {
        JobflowError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for JobflowError {
    fn from(error: serde_json::Error) -> Self {
        JobflowError::Validation(format!("JSON serialization error: {error}"))
    }
}

impl From<crate::config::ConfigurationError> for JobflowError {
    fn from(error: crate::config::ConfigurationError) -> Self {
        JobflowError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JobflowError>;
