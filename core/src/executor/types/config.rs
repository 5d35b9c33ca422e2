use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to the rest of a run when a task fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record every transitive dependent of the failed task as FAILED without
    /// running it; independent branches keep going.
    #[default]
    SkipDependents,
    /// Start nothing new after the first failure; in-flight tasks finish and
    /// everything not yet started is recorded as cancelled.
    FailFast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of executor calls in flight.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Upper bound for a single executor call.
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Enable visual progress bar (disabled for jsonl output)
    #[serde(default)]
    pub progress_bar: bool,
}

fn default_max_parallel() -> usize {
    4
}

fn default_task_timeout_ms() -> u64 {
    120_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            task_timeout_ms: default_task_timeout_ms(),
            failure_policy: FailurePolicy::default(),
            progress_bar: false,
        }
    }
}

impl SchedulerConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}
