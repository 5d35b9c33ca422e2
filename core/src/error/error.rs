use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("editor error: {0}")]
    Editor(#[from] EditorError),
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("run failed: {0}")]
    RunFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised by `GraphStore` implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("workflow not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Editor errors. The in-memory edit has already been applied when these are
/// returned; only persistence failed, and `flush` retries it.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("failed to persist workflow {workflow_id}: {source}")]
    Persist {
        workflow_id: String,
        #[source]
        source: StoreError,
    },
    #[error("unknown task: {0}")]
    UnknownTask(String),
    #[error(transparent)]
    Run(#[from] ExecutorError),
}
