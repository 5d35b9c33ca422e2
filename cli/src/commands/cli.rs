use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use canvasflow_core::graph::TaskType;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "canvasflow", version, about = "Edit and run canvasflow workflows")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of the default search path.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// ASCII-only status words in text output.
    #[arg(long, global = true)]
    pub ascii: bool,
}

fn parse_task_type(s: &str) -> Result<TaskType, String> {
    s.parse()
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AddArgs {
    pub workflow: String,

    /// input, generation, transformation, analysis or human-review
    #[arg(value_parser = parse_task_type)]
    pub task_type: TaskType,

    /// Task the new one depends on (id or unique id prefix).
    #[arg(long)]
    pub after: Option<String>,

    #[arg(long)]
    pub name: Option<String>,
}

/// Settings flags shared by `update`. Only flags that apply to the task's
/// type are used.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// INPUT: literal text value.
    #[arg(long)]
    pub text: Option<String>,

    /// GENERATION: prompt id from `[executor.prompts]`.
    #[arg(long)]
    pub prompt_id: Option<String>,

    /// GENERATION: model name.
    #[arg(long)]
    pub model: Option<String>,

    /// TRANSFORMATION: shell code run with the context JSON on stdin.
    #[arg(long)]
    pub code: Option<String>,

    /// ANALYSIS / HUMAN_REVIEW: context key to read.
    #[arg(long)]
    pub source_key: Option<String>,

    /// HUMAN_REVIEW: reviewer instructions.
    #[arg(long)]
    pub instructions: Option<String>,

    /// Output key in the execution context.
    #[arg(long)]
    pub target_key: Option<String>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.prompt_id.is_none()
            && self.model.is_none()
            && self.code.is_none()
            && self.source_key.is_none()
            && self.instructions.is_none()
            && self.target_key.is_none()
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct UpdateArgs {
    pub workflow: String,
    pub task: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long = "type", value_parser = parse_task_type)]
    pub task_type: Option<TaskType>,

    #[arg(long, requires = "y", allow_negative_numbers = true)]
    pub x: Option<f64>,

    #[arg(long, requires = "x", allow_negative_numbers = true)]
    pub y: Option<f64>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EdgeArgs {
    pub workflow: String,
    /// Upstream task.
    pub source: String,
    /// Task that will depend on `source`.
    pub target: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    pub workflow: String,

    #[arg(long)]
    pub max_parallel: Option<usize>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Halt the run at the first failure instead of skipping dependents.
    #[arg(long)]
    pub fail_fast: bool,

    /// Draw progress bars (text output only).
    #[arg(long)]
    pub progress: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GesturesArgs {
    pub workflow: String,

    /// JSONL file of pointer/wheel events.
    pub script: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty workflow.
    New { name: String },
    /// List stored workflows.
    List,
    /// Show a workflow with the latest status of each task.
    Show { workflow: String },
    Delete { workflow: String },
    /// Add a task centred in the saved viewport.
    Add(AddArgs),
    Remove { workflow: String, task: String },
    Update(UpdateArgs),
    Connect(EdgeArgs),
    Disconnect(EdgeArgs),
    /// Print execution stages without running.
    Plan { workflow: String },
    Run(RunArgs),
    /// Replay canvas gestures from a JSONL script.
    Gestures(GesturesArgs),
}
