//! # Trigger Execution
//!
//! Runs scheduled process triggers with all-or-nothing semantics against the
//! store, while guaranteeing the finish hook on every path.
//!
//! The executor does not coordinate concurrent attempts of the same trigger;
//! callers that need that must hold an external lock.

pub mod executor;
pub mod handler;
pub mod repository;
pub mod unit_of_work;

pub use executor::{
    exit_status, parse_trigger_id, ExecutionPhase, TriggerExecutionReport, TriggerExecutor,
    EXIT_FAILURE, EXIT_SUCCESS,
};
pub use handler::{root_job_request, EnqueueRootJobHandler, TriggerHandler};
pub use repository::{MemoryTriggerRepository, PgTriggerRepository, TriggerRepository};
pub use unit_of_work::{PgUnitOfWork, UnitOfWork};
