use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use canvasflow_cli::app::App;
use canvasflow_cli::commands::cli;
use canvasflow_core::config::{self, LoggingConfig};
use canvasflow_core::error::{CliError, EditorError};

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match &args.config {
        Some(path) => config::load_from_path(path),
        None => config::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    tracing::debug!(store = ?cfg.store.kind, format = args.format.as_str(), "starting");
    let app = App::new(cfg, args.format, args.ascii)?;
    app.execute(args.command).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 11: config error
    // 20: store / io / bad command input
    // 30: run failed or rejected
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Store(_) | CliError::Io(_) | CliError::Command(_) => 20,
        CliError::Editor(ee) => match ee {
            EditorError::Run(_) => 30,
            EditorError::Persist { .. } | EditorError::UnknownTask(_) => 20,
        },
        CliError::Executor(_) | CliError::RunFailed(_) => 30,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(shellexpand::tilde(d).into_owned()),
            None => std::env::temp_dir().join("canvasflow"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("canvasflow.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    // stdout carries command output; logs go to stderr
    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
