//! # System Constants
//!
//! Channel names, command names and status groupings shared by the job
//! execution core.

// Re-export state types for convenience
pub use crate::state_machine::JobStatus;

/// Real-time notification channels
pub mod channels {
    /// Fired with an empty payload when no consumer is alive
    pub const MESSAGE_QUEUE_HEARTBEAT: &str = "jobflow_message_queue_heartbeat";
}

/// Command names used for cron registration
pub mod commands {
    pub const HANDLE_TRIGGER: &str = "jobflow:process:handle-trigger";

    /// Program line cron runs for a `HANDLE_TRIGGER` schedule
    pub const HANDLE_TRIGGER_PROGRAM: &str = "jobflow-trigger handle";
}

/// System-wide constants
pub mod system {
    /// Decimal places kept for aggregated progress
    pub const PROGRESS_PRECISION: i32 = 4;

    /// Fixed-point scale used when summing child progress; integer sums do
    /// not depend on the order children are added in
    pub const PROGRESS_UNITS_PER_WHOLE: u64 = 1_000_000_000;

    /// Default heartbeat update period in minutes
    pub const DEFAULT_HEARTBEAT_PERIOD_MINUTES: u64 = 15;

    /// Longest accepted heartbeat update period (one week)
    pub const MAX_HEARTBEAT_PERIOD_MINUTES: u64 = 7 * 24 * 60;

    /// Upper bound of the pg_notify payload
    pub const MAX_NOTIFY_PAYLOAD_BYTES: usize = 7800;
}

/// Status groupings for aggregation logic
pub mod status_groups {
    use super::JobStatus;

    /// Statuses after which a job never changes again
    pub const TERMINAL_STATUSES: &[JobStatus] = &[
        JobStatus::Success,
        JobStatus::Failed,
        JobStatus::Cancelled,
        JobStatus::Stale,
    ];

    /// Statuses that mean a worker still owns the job
    pub const ACTIVE_STATUSES: &[JobStatus] = &[JobStatus::Running, JobStatus::FailedRedelivered];

    pub const ALL_STATUSES: &[JobStatus] = &[
        JobStatus::New,
        JobStatus::Running,
        JobStatus::Success,
        JobStatus::Failed,
        JobStatus::FailedRedelivered,
        JobStatus::Cancelled,
        JobStatus::Stale,
    ];
}
