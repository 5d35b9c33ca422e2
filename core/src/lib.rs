//! canvasflow core: the workflow graph model, the canvas interaction state
//! machine and the dependency-respecting scheduler.
//!
//! ```text
//! pointer/wheel events
//!   ↓
//! ViewportController (Idle | Panning | DraggingNode | Connecting)
//!   ↓
//! GraphModel (add/remove/update/connect/disconnect/set_position)
//!   ↓ gesture completion
//! GraphStore::save(Workflow)
//!
//! "run"
//!   ↓
//! Scheduler → TaskExecutor per task → ExecutionLog
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod executor;
pub mod graph;
pub mod store;
pub mod viewport;
pub mod workflow;

pub use editor::WorkflowEditor;
pub use executor::{Scheduler, TaskExecutor};
pub use graph::{ConnectOutcome, GraphModel, Point, Task, TaskConfig, TaskId, TaskType};
pub use store::GraphStore;
pub use viewport::{Viewport, ViewportController};
pub use workflow::{ExecutionLogEntry, Workflow, WorkflowStatus};
