use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

/// Get the default canvasflow data directory: ~/.canvasflow
pub fn get_canvasflow_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".canvasflow"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut cfg = toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    finalize(&mut cfg)?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.canvasflow/config.toml (highest)
    let data_dir = get_canvasflow_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    if user_config.exists() {
        return load_from_path(&user_config);
    }
    if local_config.exists() {
        return load_from_path(local_config);
    }

    let mut cfg = AppConfig::default();
    finalize(&mut cfg)?;
    Ok(cfg)
}

fn finalize(cfg: &mut AppConfig) -> anyhow::Result<()> {
    apply_env_overrides(cfg);

    let directory = match cfg
        .store
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(dir) => shellexpand::tilde(dir).into_owned(),
        None => get_canvasflow_data_dir()?
            .join("workflows")
            .to_string_lossy()
            .to_string(),
    };
    cfg.store.directory = Some(directory);

    let (min, max) = (cfg.viewport.min_zoom, cfg.viewport.max_zoom);
    // comparisons with NaN are always false
    if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
        anyhow::bail!(
            "invalid zoom range [{}, {}]",
            cfg.viewport.min_zoom,
            cfg.viewport.max_zoom
        );
    }
    cfg.scheduler.max_parallel = cfg.scheduler.max_parallel.max(1);

    Ok(())
}

// Environment variable overrides (Priority 0: highest)
fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("CANVASFLOW_STORE_DIR") {
        if !v.trim().is_empty() {
            cfg.store.directory = Some(v);
        }
    }
    if let Ok(v) = std::env::var("CANVASFLOW_MAX_PARALLEL") {
        match v.trim().parse::<usize>() {
            Ok(n) => cfg.scheduler.max_parallel = n,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid CANVASFLOW_MAX_PARALLEL"),
        }
    }
    if let Ok(v) = std::env::var("CANVASFLOW_TASK_TIMEOUT_MS") {
        match v.trim().parse::<u64>() {
            Ok(ms) => cfg.scheduler.task_timeout_ms = ms,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid CANVASFLOW_TASK_TIMEOUT_MS"),
        }
    }
}
