use serde::{Deserialize, Serialize};
use std::fmt;

/// Job status shared by root and child jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Enqueued, not picked up by a consumer yet
    New,
    /// A consumer is processing the job
    Running,
    /// Job completed successfully
    Success,
    /// Job failed and will not be retried
    Failed,
    /// Job failed but the message will be redelivered
    FailedRedelivered,
    /// Job was cancelled
    Cancelled,
    /// Job was abandoned by its consumer
    Stale,
}

impl JobStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Cancelled | Self::Stale
        )
    }

    /// Check if a consumer still owns the job
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::FailedRedelivered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::FailedRedelivered => "failed_redelivered",
            Self::Cancelled => "cancelled",
            Self::Stale => "stale",
        }
    }

    /// Whether a job may move from `self` to `to`
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        use JobStatus::*;
        match self {
            New => matches!(to, Running | Cancelled | Stale),
            Running => matches!(to, Success | Failed | FailedRedelivered | Cancelled | Stale),
            FailedRedelivered => matches!(to, Running | Failed | Cancelled | Stale),
            Success | Failed | Cancelled | Stale => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "failed_redelivered" => Ok(Self::FailedRedelivered),
            "cancelled" => Ok(Self::Cancelled),
            "stale" => Ok(Self::Stale),
            _ => Err(format!("Invalid job status: {s}")),
        }
    }
}

/// Default state for new jobs
impl Default for JobStatus {
    fn default() -> Self {
        Self::New
    }
}
