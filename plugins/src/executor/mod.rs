pub mod builtin;
pub mod renderers;

pub use builtin::BuiltinExecutor;
pub use renderers::{JsonlRendererPlugin, TextRendererPlugin};
