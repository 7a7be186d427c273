#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Jobflow Core
//!
//! Execution core of an asynchronous job and message-queue system.
//!
//! ## Overview
//!
//! Long-running work is modelled as a root job that owns many child jobs.
//! Consumers process the children independently; this crate keeps the root
//! job's status and progress consistent with them, watches that consumers are
//! alive, and runs cron-scheduled process triggers transactionally.
//!
//! ## Module Organization
//!
//! - [`models`] - Jobs, aggregate snapshots, triggers and process data
//! - [`state_machine`] - Job statuses and their allowed transitions
//! - [`store`] - Job persistence (in-memory and PostgreSQL)
//! - [`calculator`] - Root job status and progress roll-up
//! - [`heartbeat`] - Consumer liveness check and notification
//! - [`triggers`] - Transactional trigger execution with a finish hook
//! - [`scheduler`] - Cron registration of triggers
//! - [`config`] - Configuration management
//! - [`database`] - Pool construction and migrations
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jobflow_core::calculator::RootJobStatusUpdater;
//! use jobflow_core::models::NewJob;
//! use jobflow_core::store::{JobStore, MemoryJobStore};
//! use jobflow_core::JobStatus;
//!
//! # async fn example() -> jobflow_core::Result<()> {
//! let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
//! let root = store.create_root_job(NewJob::named("import")).await?;
//! let child = store.create_child_job(root.id, NewJob::named("import:chunk")).await?;
//!
//! let updater = RootJobStatusUpdater::new(store.clone());
//! let update = updater
//!     .apply_child_status(child.id, JobStatus::Running, Some(0.5))
//!     .await?;
//! println!("root job is now {}", update.current.status);
//! # Ok(())
//! # }
//! ```

pub mod calculator;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod state_machine;
pub mod store;
pub mod triggers;

pub use calculator::{
    aggregate, CollectionStatusCalculator, QueryStatusCalculator, RootJobStatusUpdater,
    StatusCalculator, StatusCalculatorResolver,
};
pub use config::{ConfigManager, JobflowConfig};
pub use constants::{status_groups, system};
pub use error::{JobflowError, Result};
pub use heartbeat::{ConsumerHeartbeatCheck, HeartbeatCheckOutcome};
pub use models::{AggregateStatus, ChildJobView, Job, NewJob, ProcessData, TransitionTrigger};
pub use state_machine::{JobStateMachine, JobStatus};
pub use store::{JobStore, MemoryJobStore, PgJobStore};
pub use triggers::{TriggerExecutionReport, TriggerExecutor};
