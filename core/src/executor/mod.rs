//! Dependency-driven workflow execution.
//!
//! ```text
//! Workflow.graph (frozen copy)
//!   ↓
//! TaskGraph::from_tasks() → validate() → topological_sort() (plan / display)
//!   ↓
//! DependencyTracker: release a task once all its dependencies COMPLETED
//!   ↓
//! Scheduler::run(): semaphore-bounded spawn + timeout per TaskExecutor call
//!   ↓
//! ExecutionLogEntry appended per terminal task (completion order)
//! ```

mod engine;
mod graph;
mod progress;
mod scheduler;
pub mod traits;
pub mod types;

pub use engine::{Scheduler, SchedulerBuilder};
pub use graph::TaskGraph;
pub use progress::ProgressMonitor;
pub use scheduler::DependencyTracker;
pub use traits::{OutputRendererPlugin, RenderEvent, TaskExecutor};
pub use types::{
    ExecutionContext, FailurePolicy, RunReport, SchedulerConfig, TaskLike,
};
