//! Persistence capability for whole-workflow snapshots.

pub mod r#trait;

pub use r#trait::GraphStore;
