pub mod aggregate;
pub mod job;
pub mod process_data;
pub mod transition_trigger;

// Re-export core models for easy access
pub use aggregate::{effective_progress, progress_units, AggregateStatus, ChildStatusCounts};
pub use job::{validate_progress, ChildJobQuery, ChildJobView, Job, NewJob};
pub use process_data::ProcessData;
pub use transition_trigger::{TransitionTrigger, TriggerDefinition};
