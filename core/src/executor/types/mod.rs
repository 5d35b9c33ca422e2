pub mod config;
pub mod context;
pub mod result;
pub mod task;

pub use config::*;
pub use context::*;
pub use result::*;
pub use task::*;
