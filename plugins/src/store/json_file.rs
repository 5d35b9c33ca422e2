use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use canvasflow_core::error::StoreError;
use canvasflow_core::workflow::{Workflow, WorkflowSummary};
use canvasflow_core::GraphStore;

/// One pretty-printed JSON document per workflow: `<dir>/<id>.json`.
///
/// Saves write a sibling temp file and rename it into place, so a crash
/// mid-write leaves the previous snapshot intact.
pub struct JsonFileGraphStore {
    dir: PathBuf,
}

impl JsonFileGraphStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config_dir(dir: &str) -> Self {
        Self::new(shellexpand::tilde(dir).into_owned())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, workflow_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !workflow_id.is_empty()
            && workflow_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Backend(format!("invalid workflow id: {workflow_id:?}")));
        }
        Ok(self.dir.join(format!("{workflow_id}.json")))
    }
}

fn not_found(workflow_id: &str, err: std::io::Error) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::NotFound(workflow_id.to_string())
    } else {
        StoreError::Io(err)
    }
}

#[async_trait]
impl GraphStore for JsonFileGraphStore {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn load(&self, workflow_id: &str) -> Result<Workflow, StoreError> {
        let path = self.path_for(workflow_id)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found(workflow_id, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let path = self.path_for(&workflow.id)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(workflow)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(workflow_id = %workflow.id, path = %path.display(), "workflow written");
        Ok(())
    }

    async fn delete(&self, workflow_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(workflow_id)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found(workflow_id, e))
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let parsed = tokio::fs::read(&path)
                .await
                .map_err(StoreError::from)
                .and_then(|bytes| Ok(serde_json::from_slice::<Workflow>(&bytes)?));
            match parsed {
                Ok(wf) => summaries.push(wf.summary()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable workflow file");
                }
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}
