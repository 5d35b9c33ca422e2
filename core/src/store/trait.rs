use async_trait::async_trait;

use crate::error::StoreError;
use crate::workflow::{Workflow, WorkflowSummary};

/// Loads and saves whole workflows (graph, status, log and viewport).
///
/// `save` must either persist the full snapshot or fail without touching the
/// previously stored one. Callers keep their in-memory copy on failure.
#[async_trait]
pub trait GraphStore: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self, workflow_id: &str) -> Result<Workflow, StoreError>;
    async fn save(&self, workflow: &Workflow) -> Result<(), StoreError>;
    async fn delete(&self, workflow_id: &str) -> Result<(), StoreError>;
    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError>;
}
