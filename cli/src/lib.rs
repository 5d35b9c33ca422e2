//! canvasflow command line: workflow editing, planning, runs and gesture
//! replay on top of `canvasflow-core` and the builtin plugins.

pub mod app;
pub mod commands;
pub mod gestures;
