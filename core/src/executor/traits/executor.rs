use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskError;
use crate::executor::types::ExecutionContext;
use crate::graph::{TaskConfig, TaskType};

/// Capability that performs one task (model call, transform, analysis...).
///
/// Invoked once per task per run. The scheduler bounds every call with a
/// timeout and records the result verbatim in the execution log.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(
        &self,
        task_type: TaskType,
        config: &TaskConfig,
        context: &ExecutionContext,
    ) -> Result<Value, TaskError>;
}
