#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use canvasflow_core::error::{StoreError, TaskError};
use canvasflow_core::executor::{
    ExecutionContext, OutputRendererPlugin, RenderEvent, Scheduler, SchedulerConfig,
};
use canvasflow_core::graph::{TaskConfig, TaskType};
use canvasflow_core::workflow::{Workflow, WorkflowSummary};
use canvasflow_core::{GraphStore, TaskExecutor};

/// What the scripted executor does for one task id.
#[derive(Debug, Clone)]
pub enum Step {
    Succeed { delay_ms: u64 },
    Fail { delay_ms: u64, message: String },
    Hang,
    Panic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Journal {
    Started(String),
    Finished(String),
}

/// Executor whose behaviour is scripted per task id. Unscripted tasks succeed
/// immediately. Every call is journaled and concurrency is tracked.
#[derive(Default)]
pub struct ScriptedExecutor {
    steps: Mutex<HashMap<String, Step>>,
    journal: Mutex<Vec<Journal>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, task_id: &str, step: Step) {
        self.steps
            .lock()
            .unwrap()
            .insert(task_id.to_string(), step);
    }

    pub fn journal(&self) -> Vec<Journal> {
        self.journal.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Index of a journal event, panicking when absent.
    pub fn position(&self, event: &Journal) -> usize {
        self.journal()
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("{event:?} not in journal"))
    }

    fn enter(&self, task_id: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.journal
            .lock()
            .unwrap()
            .push(Journal::Started(task_id.to_string()));
    }

    fn leave(&self, task_id: &str) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.journal
            .lock()
            .unwrap()
            .push(Journal::Finished(task_id.to_string()));
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(
        &self,
        task_type: TaskType,
        config: &TaskConfig,
        context: &ExecutionContext,
    ) -> Result<Value, TaskError> {
        let task_id = context.task_id().to_string();
        let step = self
            .steps
            .lock()
            .unwrap()
            .get(&task_id)
            .cloned()
            .unwrap_or(Step::Succeed { delay_ms: 0 });

        self.enter(&task_id);
        let result = match step {
            Step::Succeed { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let upstream: Vec<String> = context.upstream().map(|(k, _)| k.to_string()).collect();
                Ok(json!({
                    "task": task_id,
                    "type": task_type.slug(),
                    "key": config.target_key,
                    "upstream": upstream,
                }))
            }
            Step::Fail { delay_ms, message } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(TaskError::Failed(message))
            }
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Value::Null)
            }
            Step::Panic => panic!("scripted panic in {task_id}"),
        };
        self.leave(&task_id);
        result
    }
}

/// Renderer that keeps every event.
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl OutputRendererPlugin for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "memory"
    }

    fn render(&self, event: &RenderEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Minimal in-process store.
#[derive(Default)]
pub struct MemoryStore {
    workflows: Mutex<HashMap<String, Workflow>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<Workflow> {
        self.workflows.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    fn name(&self) -> &str {
        "test-memory"
    }

    async fn load(&self, workflow_id: &str) -> Result<Workflow, StoreError> {
        self.get(workflow_id)
            .ok_or_else(|| StoreError::NotFound(workflow_id.to_string()))
    }

    async fn save(&self, workflow: &Workflow) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.workflows
            .lock()
            .unwrap()
            .insert(workflow.id.clone(), workflow.clone());
        Ok(())
    }

    async fn delete(&self, workflow_id: &str) -> Result<(), StoreError> {
        self.workflows
            .lock()
            .unwrap()
            .remove(workflow_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(workflow_id.to_string()))
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>, StoreError> {
        Ok(self
            .workflows
            .lock()
            .unwrap()
            .values()
            .map(Workflow::summary)
            .collect())
    }
}

pub fn scheduler(executor: Arc<ScriptedExecutor>, config: SchedulerConfig) -> Scheduler {
    Scheduler::builder(executor).config(config).build()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("canvasflow_core=debug")
        .try_init();
}
