use thiserror::Error;

use crate::workflow::TransitionError;

/// Structural errors detected before a run starts. Per-task failures are never
/// raised; they land in the execution log.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("Dependency not found: task '{task_id}' depends on '{missing_dep}'")]
    DependencyNotFound {
        task_id: String,
        missing_dep: String,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Workflow {0} is already running")]
    AlreadyRunning(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(#[from] TransitionError),
}

/// Failure reported by a `TaskExecutor`. Its display text is recorded verbatim.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Failed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
