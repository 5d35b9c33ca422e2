pub mod json_file;
pub mod memory;

pub use json_file::JsonFileGraphStore;
pub use memory::InMemoryGraphStore;
