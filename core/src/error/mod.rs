#[allow(clippy::module_inception)]
pub mod error;
pub mod executor;

pub use error::{CliError, EditorError, StoreError};
pub use executor::{ExecutorError, TaskError};
