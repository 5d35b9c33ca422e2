use std::collections::HashMap;
use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use canvasflow_core::config::{ExecutorConfig, ReviewPolicy};
use canvasflow_core::error::TaskError;
use canvasflow_core::executor::{ExecutionContext, TaskExecutor};
use canvasflow_core::graph::{InputSource, TaskConfig, TaskSettings, TaskType};

/// Executor that handles every task type locally, without a model backend.
///
/// - INPUT: the text value, or the file metadata for file/audio/video inputs
/// - GENERATION: renders the referenced prompt template from the context
/// - TRANSFORMATION: runs `code` through the configured shell, context JSON on stdin
/// - ANALYSIS: character, word and line counts of the source value
/// - HUMAN_REVIEW: approves or rejects per the configured review policy
pub struct BuiltinExecutor {
    prompts: HashMap<String, String>,
    shell: String,
    review: ReviewPolicy,
    placeholder: Regex,
}

impl BuiltinExecutor {
    pub fn new(cfg: &ExecutorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            prompts: cfg.prompts.clone(),
            shell: cfg.shell.clone(),
            review: cfg.review,
            placeholder: Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}")?,
        })
    }

    fn input(&self, source: InputSource) -> Result<Value, TaskError> {
        match source {
            InputSource::Text { value } => Ok(Value::String(value)),
            other => serde_json::to_value(other).map_err(|e| TaskError::Failed(e.to_string())),
        }
    }

    fn generation(
        &self,
        prompt_id: Option<String>,
        model: Option<String>,
        context: &ExecutionContext,
    ) -> Result<Value, TaskError> {
        let prompt = match prompt_id.as_deref() {
            Some(id) => {
                let template = self
                    .prompts
                    .get(id)
                    .ok_or_else(|| TaskError::InvalidConfig(format!("unknown prompt: {id}")))?;
                self.render_template(template, context)?
            }
            None => context
                .upstream()
                .map(|(_, v)| as_text(v))
                .collect::<Vec<_>>()
                .join("\n\n"),
        };

        Ok(json!({
            "prompt": prompt,
            "prompt_id": prompt_id,
            "model": model,
        }))
    }

    /// Fill `{{key}}` placeholders from the context. `{{input}}` is the first
    /// upstream output.
    fn render_template(&self, template: &str, context: &ExecutionContext) -> Result<String, TaskError> {
        let mut missing = Vec::new();
        let rendered = self.placeholder.replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            let value = match key {
                "input" => context.resolve(None),
                _ => context.get(key),
            };
            match value {
                Some(v) => as_text(v),
                None => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        });

        if !missing.is_empty() {
            return Err(TaskError::InvalidConfig(format!(
                "unresolved placeholders: {}",
                missing.join(", ")
            )));
        }
        Ok(rendered.into_owned())
    }

    async fn transformation(&self, code: &str, context: &ExecutionContext) -> Result<Value, TaskError> {
        if code.trim().is_empty() {
            return Ok(context.resolve(None).cloned().unwrap_or(Value::Null));
        }

        let payload = serde_json::to_vec(context.values())
            .map_err(|e| TaskError::Failed(e.to_string()))?;

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                // the script may exit without reading its input
                let _ = stdin.write_all(&payload).await;
            });
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TaskError::Failed(format!(
                "transformation exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        Ok(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
    }

    fn analysis(&self, source_key: Option<&str>, context: &ExecutionContext) -> Result<Value, TaskError> {
        let value = context
            .resolve(source_key)
            .ok_or_else(|| TaskError::InvalidConfig("nothing to analyze".into()))?;
        let text = as_text(value);

        Ok(json!({
            "characters": text.chars().count(),
            "words": text.split_whitespace().count(),
            "lines": text.lines().count(),
        }))
    }

    fn review(
        &self,
        instructions: Option<String>,
        source_key: Option<&str>,
        context: &ExecutionContext,
    ) -> Result<Value, TaskError> {
        match self.review {
            ReviewPolicy::AutoApprove => Ok(json!({
                "approved": true,
                "instructions": instructions,
                "value": context.resolve(source_key).cloned().unwrap_or(Value::Null),
            })),
            ReviewPolicy::Reject => Err(TaskError::Failed("review rejected".into())),
        }
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TaskExecutor for BuiltinExecutor {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn execute(
        &self,
        task_type: TaskType,
        config: &TaskConfig,
        context: &ExecutionContext,
    ) -> Result<Value, TaskError> {
        tracing::debug!(task_id = %context.task_id(), task_type = %task_type, "builtin executor");

        match config.settings_for(task_type) {
            TaskSettings::Input { source } => self.input(source),
            TaskSettings::Generation { prompt_id, model } => {
                self.generation(prompt_id, model, context)
            }
            TaskSettings::Transformation { code } => self.transformation(&code, context).await,
            TaskSettings::Analysis { source_key } => self.analysis(source_key.as_deref(), context),
            TaskSettings::HumanReview {
                instructions,
                source_key,
            } => self.review(instructions, source_key.as_deref(), context),
        }
    }
}
