use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::WorkflowStatus;

/// Result of running a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,

    pub workflow_id: String,

    /// The run's `last_run` stamp.
    pub started_at: DateTime<Utc>,

    /// Final workflow status (COMPLETED or FAILED)
    pub status: WorkflowStatus,

    /// Total number of tasks in the graph
    pub total_tasks: usize,

    /// Number of tasks that completed successfully
    pub completed: usize,

    /// Number of tasks recorded as failed (including skipped and cancelled)
    pub failed: usize,

    /// Total execution duration in milliseconds
    pub duration_ms: u64,

    /// Task ids in the order their log entries were appended
    pub completion_order: Vec<String>,

    /// Kahn stages of the frozen graph (for display)
    pub stages: Vec<Vec<String>>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }
}
