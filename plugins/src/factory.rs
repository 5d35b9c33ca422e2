use std::sync::Arc;

use anyhow::Result;

use canvasflow_core::config::{AppConfig, ExecutorConfig, StoreConfig, StoreKind};
use canvasflow_core::executor::{OutputRendererPlugin, Scheduler, TaskExecutor};
use canvasflow_core::GraphStore;

use crate::executor::{BuiltinExecutor, JsonlRendererPlugin, TextRendererPlugin};
use crate::store::{InMemoryGraphStore, JsonFileGraphStore};

pub fn build_store(cfg: &StoreConfig) -> Result<Arc<dyn GraphStore>> {
    match cfg.kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryGraphStore::new())),
        StoreKind::File => {
            let dir = cfg
                .directory
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("store.directory is not set"))?;
            Ok(Arc::new(JsonFileGraphStore::from_config_dir(dir)))
        }
    }
}

pub fn build_executor(cfg: &ExecutorConfig) -> Result<Arc<dyn TaskExecutor>> {
    Ok(Arc::new(BuiltinExecutor::new(cfg)?))
}

pub fn build_renderer(format: &str, ascii: bool) -> Arc<dyn OutputRendererPlugin> {
    match format {
        "jsonl" => Arc::new(JsonlRendererPlugin::new(false)),
        // anything else renders as text
        _ => Arc::new(TextRendererPlugin::new(ascii)),
    }
}

/// Scheduler wired with the builtin executor and the requested renderer.
/// The progress bar is only drawn for text output.
pub fn build_scheduler(cfg: &AppConfig, format: &str, ascii: bool) -> Result<Scheduler> {
    let mut scheduler_cfg = cfg.scheduler.clone();
    scheduler_cfg.progress_bar &= format != "jsonl";

    Ok(Scheduler::builder(build_executor(&cfg.executor)?)
        .config(scheduler_cfg)
        .renderer(build_renderer(format, ascii))
        .build())
}
