//! The extraction workflow: interpret → validate → human review →
//! finalize, with one feedback edge from review back to interpret.

pub mod engine;
pub mod graph;
pub mod review;
pub mod stages;
pub mod state;
pub mod store;
pub mod transition;

pub use engine::{RunOutcome, Workflow, WorkflowError};
pub use review::{ReviewDecision, ReviewPrompt, Reviewer};
pub use state::{FinalResult, LogEntry, Status, Step, WorkflowState};
pub use store::{JsonFileStore, StateStore, StoreError};
pub use transition::ReviewPolicy;
