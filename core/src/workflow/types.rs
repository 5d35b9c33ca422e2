use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::GraphModel;
use crate::viewport::Viewport;

use super::transitions::{StatusTransition, TransitionError};

/// Workflow-level execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Terminal per-task status recorded in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskRunStatus {
    Completed,
    Failed,
}

/// One append-only log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub task_id: String,
    pub status: TaskRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The run's `last_run` stamp; correlates the entry with its run.
    pub timestamp: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl ExecutionLogEntry {
    pub fn completed(
        task_id: impl Into<String>,
        output: serde_json::Value,
        run_stamp: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskRunStatus::Completed,
            output: Some(output),
            error: None,
            timestamp: run_stamp,
            finished_at: Utc::now(),
            duration_ms,
        }
    }

    pub fn failed(
        task_id: impl Into<String>,
        error: impl Into<String>,
        run_stamp: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskRunStatus::Failed,
            output: None,
            error: Some(error.into()),
            timestamp: run_stamp,
            finished_at: Utc::now(),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskRunStatus::Completed
    }
}

/// Listing row returned by stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub task_count: usize,
    pub status: WorkflowStatus,
    pub updated_at: DateTime<Utc>,
}

/// A user-assembled task graph plus its run history. Persisted as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(rename = "tasks", default)]
    pub graph: GraphModel,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_log: Vec<ExecutionLogEntry>,
    #[serde(default)]
    pub viewport: Viewport,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            graph: GraphModel::new(),
            status: WorkflowStatus::Idle,
            last_run: None,
            execution_log: Vec::new(),
            viewport: Viewport::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            task_count: self.graph.len(),
            status: self.status,
            updated_at: self.updated_at,
        }
    }

    /// Move to `next`, rejecting transitions the status machine does not allow.
    pub fn transition_to(&mut self, next: WorkflowStatus) -> Result<(), TransitionError> {
        StatusTransition::validate(self.status, next)?;
        self.status = next;
        Ok(())
    }

    /// Mark a persisted RUNNING status (left behind by an interrupted process) as FAILED.
    pub fn recover_interrupted(&mut self) -> bool {
        if self.status == WorkflowStatus::Running {
            self.status = WorkflowStatus::Failed;
            return true;
        }
        false
    }

    /// Entries belonging to the most recent run, in completion order.
    pub fn run_entries(&self) -> Vec<&ExecutionLogEntry> {
        let Some(stamp) = self.last_run else {
            return Vec::new();
        };
        self.execution_log
            .iter()
            .filter(|e| e.timestamp == stamp)
            .collect()
    }

    /// Latest log entry for `task_id` in the most recent run.
    pub fn latest_entry(&self, task_id: &str) -> Option<&ExecutionLogEntry> {
        let stamp = self.last_run?;
        self.execution_log
            .iter()
            .rev()
            .find(|e| e.task_id == task_id && e.timestamp == stamp)
    }

    pub fn latest_status(&self, task_id: &str) -> Option<TaskRunStatus> {
        self.latest_entry(task_id).map(|e| e.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_latest_status_uses_current_run_only() {
        let mut wf = Workflow::new("demo");
        let first = Utc::now() - Duration::seconds(10);
        let second = Utc::now();

        wf.execution_log
            .push(ExecutionLogEntry::completed("t1", serde_json::json!("a"), first, 1));
        wf.execution_log
            .push(ExecutionLogEntry::failed("t1", "boom", second, 1));
        wf.execution_log
            .push(ExecutionLogEntry::completed("t2", serde_json::json!("b"), first, 1));

        assert_eq!(wf.latest_status("t1"), None);

        wf.last_run = Some(second);
        assert_eq!(wf.latest_status("t1"), Some(TaskRunStatus::Failed));
        assert_eq!(wf.latest_status("t2"), None);
        assert_eq!(wf.run_entries().len(), 1);

        wf.last_run = Some(first);
        assert_eq!(wf.latest_status("t1"), Some(TaskRunStatus::Completed));
    }

    #[test]
    fn test_transition_to() {
        let mut wf = Workflow::new("demo");
        assert!(wf.transition_to(WorkflowStatus::Completed).is_err());
        assert_eq!(wf.status, WorkflowStatus::Idle);

        wf.transition_to(WorkflowStatus::Running).unwrap();
        assert!(wf.recover_interrupted());
        assert_eq!(wf.status, WorkflowStatus::Failed);
        assert!(!wf.recover_interrupted());
    }

    #[test]
    fn test_serialized_shape() {
        let wf = Workflow::new("demo");
        let value = serde_json::to_value(&wf).unwrap();
        assert!(value["tasks"].is_array());
        assert_eq!(value["status"], "IDLE");
        assert_eq!(value["viewport"]["zoom"], 1.0);

        let back: Workflow = serde_json::from_value(value).unwrap();
        assert_eq!(back, wf);
    }
}
