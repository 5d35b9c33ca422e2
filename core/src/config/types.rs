use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use crate::executor::types::{FailurePolicy, SchedulerConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "canvasflow_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,

    /// Workflow directory for the file store. `~` is expanded.
    /// Defaults to `~/.canvasflow/workflows`.
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    /// Zoom change per wheel delta unit.
    #[serde(default = "default_zoom_sensitivity")]
    pub zoom_sensitivity: f64,
    /// Anchor wheel zoom at the pointer instead of the canvas origin.
    #[serde(default)]
    pub zoom_to_cursor: bool,
    #[serde(default = "default_container_width")]
    pub container_width: f64,
    #[serde(default = "default_container_height")]
    pub container_height: f64,
}

fn default_min_zoom() -> f64 {
    0.1
}

fn default_max_zoom() -> f64 {
    3.0
}

fn default_zoom_sensitivity() -> f64 {
    0.001
}

fn default_container_width() -> f64 {
    1200.0
}

fn default_container_height() -> f64 {
    800.0
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            zoom_sensitivity: default_zoom_sensitivity(),
            zoom_to_cursor: false,
            container_width: default_container_width(),
            container_height: default_container_height(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    #[default]
    AutoApprove,
    Reject,
}

/// Settings for the builtin task executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Prompt library: prompt id -> template with `{{key}}` placeholders.
    #[serde(default)]
    pub prompts: HashMap<String, String>,

    /// Shell used to run transformation code.
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub review: ReviewPolicy,
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            prompts: HashMap::new(),
            shell: default_shell(),
            review: ReviewPolicy::default(),
        }
    }
}
