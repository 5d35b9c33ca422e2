//! Workflow status transition rules.

use super::types::WorkflowStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: WorkflowStatus,
        to: WorkflowStatus,
    },
}

/// IDLE -> RUNNING -> {COMPLETED | FAILED} -> IDLE, with re-runs going straight
/// from a terminal status back to RUNNING.
pub struct StatusTransition;

impl StatusTransition {
    pub fn validate(from: WorkflowStatus, to: WorkflowStatus) -> Result<(), TransitionError> {
        let is_valid = match (from, to) {
            (WorkflowStatus::Idle, WorkflowStatus::Running) => true,

            (WorkflowStatus::Running, WorkflowStatus::Completed)
            | (WorkflowStatus::Running, WorkflowStatus::Failed) => true,

            // re-run or reset
            (WorkflowStatus::Completed | WorkflowStatus::Failed, WorkflowStatus::Running)
            | (WorkflowStatus::Completed | WorkflowStatus::Failed, WorkflowStatus::Idle) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn can_start(status: WorkflowStatus) -> bool {
        status != WorkflowStatus::Running
    }
}
