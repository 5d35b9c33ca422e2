//! Command implementations: resolve ids, open an editor on the configured
//! store and apply one operation.
use std::sync::Arc;

use serde_json::{json, Value};

use canvasflow_core::config::{AppConfig, FailurePolicy};
use canvasflow_core::error::{CliError, StoreError};
use canvasflow_core::graph::{InputSource, Point, TaskPatch, TaskSettings};
use canvasflow_core::workflow::{Workflow, WorkflowSummary};
use canvasflow_core::{GraphStore, WorkflowEditor};
use canvasflow_plugins::factory;

use crate::commands::cli::{
    AddArgs, Commands, EdgeArgs, GesturesArgs, OutputFormat, RunArgs, SettingsArgs, UpdateArgs,
};
use crate::gestures;

/// What a command prints: text lines, or one JSON document for `--format jsonl`.
#[derive(Debug, Default)]
pub struct Output {
    pub lines: Vec<String>,
    pub value: Value,
}

impl Output {
    fn new(lines: Vec<String>, value: Value) -> Self {
        Self { lines, value }
    }

    pub fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Text => {
                for line in &self.lines {
                    println!("{line}");
                }
            }
            OutputFormat::Jsonl => {
                if !self.value.is_null() {
                    println!("{}", self.value);
                }
            }
        }
    }
}

pub struct App {
    cfg: AppConfig,
    store: Arc<dyn GraphStore>,
    format: OutputFormat,
    ascii: bool,
}

impl App {
    pub fn new(cfg: AppConfig, format: OutputFormat, ascii: bool) -> Result<Self, CliError> {
        let store = factory::build_store(&cfg.store).map_err(|e| CliError::Config(e.to_string()))?;
        Ok(Self::with_store(cfg, store, format, ascii))
    }

    pub fn with_store(
        cfg: AppConfig,
        store: Arc<dyn GraphStore>,
        format: OutputFormat,
        ascii: bool,
    ) -> Self {
        Self {
            cfg,
            store,
            format,
            ascii,
        }
    }

    /// Run one command and print its output. Returns the process exit code.
    pub async fn execute(&self, cmd: Commands) -> Result<i32, CliError> {
        let output = self.dispatch(cmd).await?;
        output.print(self.format);
        Ok(0)
    }

    #[tracing::instrument(name = "cli.dispatch", skip(self, cmd))]
    pub async fn dispatch(&self, cmd: Commands) -> Result<Output, CliError> {
        match cmd {
            Commands::New { name } => self.new_workflow(name).await,
            Commands::List => self.list().await,
            Commands::Show { workflow } => self.show(&workflow).await,
            Commands::Delete { workflow } => self.delete(&workflow).await,
            Commands::Add(args) => self.add(args).await,
            Commands::Remove { workflow, task } => self.remove(&workflow, &task).await,
            Commands::Update(args) => self.update(args).await,
            Commands::Connect(args) => self.connect(args).await,
            Commands::Disconnect(args) => self.disconnect(args).await,
            Commands::Plan { workflow } => self.plan(&workflow).await,
            Commands::Run(args) => self.run(args).await,
            Commands::Gestures(args) => self.gestures(args).await,
        }
    }

    async fn open(&self, workflow: &str) -> Result<WorkflowEditor, CliError> {
        let id = self.resolve_workflow(workflow).await?;
        Ok(WorkflowEditor::open(&id, self.store.clone(), &self.cfg.viewport).await?)
    }

    /// Exact id, else a unique id prefix.
    async fn resolve_workflow(&self, query: &str) -> Result<String, CliError> {
        let summaries = self.store.list().await?;
        if summaries.iter().any(|s| s.id == query) {
            return Ok(query.to_string());
        }
        let ids: Vec<&str> = summaries
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| id.starts_with(query))
            .collect();
        unique(query, "workflow", ids).map_err(|e| match e {
            None => StoreError::NotFound(query.to_string()).into(),
            Some(e) => e,
        })
    }

    async fn new_workflow(&self, name: String) -> Result<Output, CliError> {
        let editor = WorkflowEditor::create(name, self.store.clone(), &self.cfg.viewport).await?;
        let wf = editor.workflow();
        tracing::info!(workflow_id = %wf.id, "workflow created");
        Ok(Output::new(
            vec![format!("created {} ({})", wf.id, wf.name)],
            json!({ "id": wf.id, "name": wf.name }),
        ))
    }

    async fn list(&self) -> Result<Output, CliError> {
        let summaries = self.store.list().await?;
        let lines = if summaries.is_empty() {
            vec!["no workflows".to_string()]
        } else {
            summaries.iter().map(summary_line).collect()
        };
        Ok(Output::new(lines, serde_json::to_value(&summaries).map_err(anyhow::Error::from)?))
    }

    async fn show(&self, workflow: &str) -> Result<Output, CliError> {
        let editor = self.open(workflow).await?;
        let wf = editor.workflow();
        Ok(Output::new(
            show_lines(wf),
            serde_json::to_value(wf).map_err(anyhow::Error::from)?,
        ))
    }

    async fn delete(&self, workflow: &str) -> Result<Output, CliError> {
        let id = self.resolve_workflow(workflow).await?;
        self.store.delete(&id).await?;
        Ok(Output::new(vec![format!("deleted {id}")], json!({ "deleted": id })))
    }

    async fn add(&self, args: AddArgs) -> Result<Output, CliError> {
        let mut editor = self.open(&args.workflow).await?;
        let after = args
            .after
            .as_deref()
            .map(|q| resolve_task(editor.workflow(), q))
            .transpose()?;
        // the editor chains new tasks from the selection
        editor.controller_mut().select(after);

        let mut task = editor.add_task(args.task_type).await?;
        if let Some(name) = args.name {
            editor
                .update_task(
                    &task.id,
                    TaskPatch {
                        name: Some(name.clone()),
                        ..TaskPatch::default()
                    },
                )
                .await?;
            task.name = name;
        }

        Ok(Output::new(
            vec![format!(
                "added {} {} \"{}\" at ({:.0}, {:.0})",
                task.id, task.task_type, task.name, task.position.x, task.position.y
            )],
            serde_json::to_value(&task).map_err(anyhow::Error::from)?,
        ))
    }

    async fn remove(&self, workflow: &str, task: &str) -> Result<Output, CliError> {
        let mut editor = self.open(workflow).await?;
        let id = resolve_task(editor.workflow(), task)?;
        editor.remove_task(&id).await?;
        Ok(Output::new(vec![format!("removed {id}")], json!({ "removed": id })))
    }

    async fn update(&self, args: UpdateArgs) -> Result<Output, CliError> {
        let mut editor = self.open(&args.workflow).await?;
        let id = resolve_task(editor.workflow(), &args.task)?;
        let Some(current) = editor.workflow().graph.get(&id).cloned() else {
            return Err(CliError::Command(format!("unknown task: {id}")));
        };

        let task_type = args.task_type.unwrap_or(current.task_type);
        let config = if args.settings.is_empty() {
            None
        } else {
            let mut config = current.config.clone();
            config.settings = apply_settings(config.settings_for(task_type), &args.settings)?;
            if let Some(key) = &args.settings.target_key {
                config.target_key = key.clone();
            }
            Some(config)
        };

        let patch = TaskPatch {
            name: args.name,
            task_type: args.task_type,
            config,
            position: args.x.zip(args.y).map(|(x, y)| Point::new(x, y)),
        };
        editor.update_task(&id, patch).await?;

        let task = editor
            .workflow()
            .graph
            .get(&id)
            .cloned()
            .ok_or_else(|| CliError::Command(format!("unknown task: {id}")))?;
        Ok(Output::new(
            vec![format!("updated {} {} \"{}\"", task.id, task.task_type, task.name)],
            serde_json::to_value(&task).map_err(anyhow::Error::from)?,
        ))
    }

    async fn connect(&self, args: EdgeArgs) -> Result<Output, CliError> {
        let mut editor = self.open(&args.workflow).await?;
        let source = resolve_task(editor.workflow(), &args.source)?;
        let target = resolve_task(editor.workflow(), &args.target)?;

        let outcome = editor.connect(&source, &target).await?;
        if !outcome.is_connected() {
            return Err(CliError::Command(format!(
                "cannot connect {source} -> {target}: {}",
                outcome.reason()
            )));
        }
        Ok(Output::new(
            vec![format!("connected {source} -> {target}")],
            json!({ "source": source, "target": target }),
        ))
    }

    async fn disconnect(&self, args: EdgeArgs) -> Result<Output, CliError> {
        let mut editor = self.open(&args.workflow).await?;
        let source = resolve_task(editor.workflow(), &args.source)?;
        let target = resolve_task(editor.workflow(), &args.target)?;

        if !editor.disconnect(&source, &target).await? {
            return Err(CliError::Command(format!(
                "{target} does not depend on {source}"
            )));
        }
        Ok(Output::new(
            vec![format!("disconnected {source} -> {target}")],
            json!({ "source": source, "target": target }),
        ))
    }

    async fn plan(&self, workflow: &str) -> Result<Output, CliError> {
        let editor = self.open(workflow).await?;
        let scheduler = factory::build_scheduler(&self.cfg, self.format.as_str(), self.ascii)?;
        let stages = scheduler.plan(editor.workflow())?;

        let wf = editor.workflow();
        let name_of = |id: &str| wf.graph.get(id).map(|t| t.name.as_str()).unwrap_or("?");
        let lines = stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let tasks: Vec<String> = stage
                    .iter()
                    .map(|id| format!("{} ({})", short(id), name_of(id)))
                    .collect();
                format!("stage {}: {}", i + 1, tasks.join(", "))
            })
            .collect();
        Ok(Output::new(lines, json!({ "workflow_id": wf.id, "stages": stages })))
    }

    async fn run(&self, args: RunArgs) -> Result<Output, CliError> {
        let mut cfg = self.cfg.clone();
        if let Some(n) = args.max_parallel {
            cfg.scheduler.max_parallel = n.max(1);
        }
        if let Some(ms) = args.timeout_ms {
            cfg.scheduler.task_timeout_ms = ms;
        }
        if args.fail_fast {
            cfg.scheduler.failure_policy = FailurePolicy::FailFast;
        }
        cfg.scheduler.progress_bar |= args.progress;

        let mut editor = self.open(&args.workflow).await?;
        let scheduler = factory::build_scheduler(&cfg, self.format.as_str(), self.ascii)?;
        let report = editor.run(&scheduler).await?;

        if !report.succeeded() {
            return Err(CliError::RunFailed(format!(
                "{} of {} tasks failed in workflow {}",
                report.failed, report.total_tasks, report.workflow_id
            )));
        }
        // the renderer has already printed the run
        Ok(Output::default())
    }

    async fn gestures(&self, args: GesturesArgs) -> Result<Output, CliError> {
        let script = tokio::fs::read_to_string(&args.script).await?;
        let events = gestures::parse_script(&script)?;

        let mut editor = self.open(&args.workflow).await?;
        let log = gestures::replay(&mut editor, &events).await?;

        let viewport = editor.controller().viewport();
        Ok(Output::new(
            log.clone(),
            json!({ "effects": log, "viewport": viewport }),
        ))
    }
}

/// Resolve `query` among candidate ids. `Err(None)` means nothing matched.
fn unique(query: &str, what: &str, ids: Vec<&str>) -> Result<String, Option<CliError>> {
    match ids.as_slice() {
        [] => Err(None),
        [one] => Ok(one.to_string()),
        many => Err(Some(CliError::Command(format!(
            "{what} prefix {query:?} is ambiguous ({} matches)",
            many.len()
        )))),
    }
}

fn resolve_task(wf: &Workflow, query: &str) -> Result<String, CliError> {
    if wf.graph.contains(query) {
        return Ok(query.to_string());
    }
    let ids = wf
        .graph
        .tasks()
        .iter()
        .map(|t| t.id.as_str())
        .filter(|id| id.starts_with(query))
        .collect();
    unique(query, "task", ids).map_err(|e| {
        e.unwrap_or_else(|| CliError::Command(format!("no task matches {query:?} in {}", wf.id)))
    })
}

/// Merge flag values into `settings`. Flags that do not belong to the
/// settings' task type are rejected.
fn apply_settings(mut settings: TaskSettings, args: &SettingsArgs) -> Result<TaskSettings, CliError> {
    let mut used: Vec<&str> = vec!["target-key"];

    match &mut settings {
        TaskSettings::Input { source } => {
            if let Some(text) = &args.text {
                *source = InputSource::Text {
                    value: text.clone(),
                };
                used.push("text");
            }
        }
        TaskSettings::Generation { prompt_id, model } => {
            if let Some(p) = &args.prompt_id {
                *prompt_id = Some(p.clone());
                used.push("prompt-id");
            }
            if let Some(m) = &args.model {
                *model = Some(m.clone());
                used.push("model");
            }
        }
        TaskSettings::Transformation { code } => {
            if let Some(c) = &args.code {
                *code = c.clone();
                used.push("code");
            }
        }
        TaskSettings::Analysis { source_key } => {
            if let Some(k) = &args.source_key {
                *source_key = Some(k.clone());
                used.push("source-key");
            }
        }
        TaskSettings::HumanReview {
            instructions,
            source_key,
        } => {
            if let Some(i) = &args.instructions {
                *instructions = Some(i.clone());
                used.push("instructions");
            }
            if let Some(k) = &args.source_key {
                *source_key = Some(k.clone());
                used.push("source-key");
            }
        }
    }

    let given = [
        ("text", args.text.is_some()),
        ("prompt-id", args.prompt_id.is_some()),
        ("model", args.model.is_some()),
        ("code", args.code.is_some()),
        ("source-key", args.source_key.is_some()),
        ("instructions", args.instructions.is_some()),
    ];
    let stray: Vec<String> = given
        .iter()
        .filter(|(flag, set)| *set && !used.contains(flag))
        .map(|(flag, _)| format!("--{flag}"))
        .collect();
    if !stray.is_empty() {
        return Err(CliError::Command(format!(
            "{} not valid for {} tasks",
            stray.join(", "),
            settings.task_type()
        )));
    }
    Ok(settings)
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn summary_line(s: &WorkflowSummary) -> String {
    format!(
        "{}  {:<24} {:>3} tasks  {:?}  {}",
        s.id,
        s.name,
        s.task_count,
        s.status,
        s.updated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

fn show_lines(wf: &Workflow) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", wf.name, wf.id),
        format!(
            "status: {:?}  last run: {}",
            wf.status,
            wf.last_run
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        ),
        format!(
            "viewport: ({:.0}, {:.0}) zoom {:.2}",
            wf.viewport.x, wf.viewport.y, wf.viewport.zoom
        ),
    ];

    for task in wf.graph.tasks() {
        let deps: Vec<&str> = task.dependencies.iter().map(|d| short(d)).collect();
        let status = wf
            .latest_status(&task.id)
            .map(|s| format!("{s:?}"))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "  {} {:<15} {:<24} after [{}]  {}",
            short(&task.id),
            task.task_type.to_string(),
            task.name,
            deps.join(", "),
            status
        ));
    }
    lines
}
