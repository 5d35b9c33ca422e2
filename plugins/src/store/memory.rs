use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use canvasflow_core::error::StoreError;
use canvasflow_core::workflow::{Workflow, WorkflowSummary};
use canvasflow_core::GraphStore;

/// Process-local store. Snapshots are cloned in and out, so callers never
/// share state with the store.
#[derive(Default)]
pub struct InMemoryGraphStore {
    workflows: RwLock<HashMap<String, Workflow>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, workflow_id: &str) -> Result<Workflow, StoreError> {
        self.workflows
            .read()
            .await
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(workflow_id.to_string()))
    }

    async fn save(&self, workflow: &Workflow) -> Result<(), StoreError> {
        self.workflows
            .write()
            .await
            .insert(workflow.id.clone(), workflow.clone());
        Ok(())
    }

    async fn delete(&self, workflow_id: &str) -> Result<(), StoreError> {
        self.workflows
            .write()
            .await
            .remove(workflow_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(workflow_id.to_string()))
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        let mut summaries: Vec<WorkflowSummary> = self
            .workflows
            .read()
            .await
            .values()
            .map(Workflow::summary)
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshots_are_isolated() {
        let store = InMemoryGraphStore::new();
        let mut wf = Workflow::new("demo");
        store.save(&wf).await.unwrap();

        wf.name = "changed".into();
        assert_eq!(store.load(&wf.id).await.unwrap().name, "demo");

        store.delete(&wf.id).await.unwrap();
        assert!(matches!(store.load(&wf.id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&wf.id).await, Err(StoreError::NotFound(_))));
    }
}
