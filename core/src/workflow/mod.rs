//! Workflow aggregate: tasks, run status and the append-only execution log.

pub mod transitions;
pub mod types;

pub use transitions::{StatusTransition, TransitionError};
pub use types::{ExecutionLogEntry, TaskRunStatus, Workflow, WorkflowStatus, WorkflowSummary};
