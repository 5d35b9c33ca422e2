//! Task graph data model.
//!
//! Pure data plus invariants: no I/O happens here. Persistence is the
//! caller's job so that per-frame position updates never reach storage.

mod model;
mod types;

pub use model::{ConnectOutcome, GraphModel};
pub use types::{
    FileMeta, InputSource, Point, Task, TaskConfig, TaskId, TaskPatch, TaskSettings, TaskType,
};
