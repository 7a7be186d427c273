// State machine module for job lifecycle management
//
// Status definitions and the transition table applied by consumers when they
// report progress on a child job.

pub mod job_state_machine;
pub mod states;

pub use job_state_machine::JobStateMachine;
pub use states::JobStatus;
