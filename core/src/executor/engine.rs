use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::ExecutorError;
use crate::graph::Task;
use crate::workflow::{ExecutionLogEntry, StatusTransition, Workflow, WorkflowStatus};

use super::graph::TaskGraph;
use super::progress::ProgressMonitor;
use super::scheduler::DependencyTracker;
use super::traits::{OutputRendererPlugin, RenderEvent, TaskExecutor};
use super::types::{ExecutionContext, RunReport, SchedulerConfig};

/// Drives workflow runs through a `TaskExecutor`.
///
/// A run freezes the workflow's graph, launches every task as soon as all of
/// its dependencies have completed (bounded by `max_parallel`), and appends
/// one terminal log entry per task in completion order.
pub struct Scheduler {
    executor: Arc<dyn TaskExecutor>,
    config: SchedulerConfig,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    active: Mutex<HashSet<String>>,
}

pub struct SchedulerBuilder {
    executor: Arc<dyn TaskExecutor>,
    config: SchedulerConfig,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
}

/// One finished executor call.
struct Finished {
    task_id: String,
    target_key: String,
    result: Result<Value, String>,
    duration_ms: u64,
}

/// Removes the workflow id from the active set when the run ends.
struct ActiveRun<'a> {
    active: &'a Mutex<HashSet<String>>,
    workflow_id: String,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        active.remove(&self.workflow_id);
    }
}

impl Scheduler {
    pub fn new(executor: Arc<dyn TaskExecutor>, config: SchedulerConfig) -> Self {
        Self {
            executor,
            config,
            renderer: None,
            active: Mutex::new(HashSet::new()),
        }
    }

    pub fn builder(executor: Arc<dyn TaskExecutor>) -> SchedulerBuilder {
        SchedulerBuilder::new(executor)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn executor_name(&self) -> &str {
        self.executor.name()
    }

    /// Validate the graph and return its Kahn stages without running anything.
    pub fn plan(&self, workflow: &Workflow) -> Result<Vec<Vec<String>>, ExecutorError> {
        let tasks = workflow.graph.tasks().to_vec();
        let graph = TaskGraph::from_tasks(&tasks)?;
        graph.validate()?;
        graph.topological_sort()
    }

    /// Run every task of `workflow` and record the results in its log.
    ///
    /// Errors are returned only when the run cannot start (already running,
    /// broken graph). Task failures end up in the log and the final status.
    pub async fn run(&self, workflow: &mut Workflow) -> Result<RunReport, ExecutorError> {
        if !StatusTransition::can_start(workflow.status) {
            return Err(ExecutorError::AlreadyRunning(workflow.id.clone()));
        }
        let _active = self.claim(&workflow.id)?;

        let tasks = workflow.graph.tasks().to_vec();
        let graph = TaskGraph::from_tasks(&tasks)?;
        graph.validate()?;
        let stages = graph.topological_sort()?;

        let run_id = Uuid::new_v4().to_string();
        let stamp = Utc::now();
        workflow.transition_to(WorkflowStatus::Running)?;
        workflow.last_run = Some(stamp);
        workflow.touch();

        let start = Instant::now();
        let total_tasks = graph.len();
        tracing::info!(
            run_id = %run_id,
            workflow_id = %workflow.id,
            total_tasks,
            stages = stages.len(),
            max_parallel = self.config.max_parallel,
            "workflow run started"
        );

        self.emit(RenderEvent::RunStart {
            run_id: run_id.clone(),
            workflow_id: workflow.id.clone(),
            total_tasks,
        });
        self.emit(RenderEvent::Plan {
            run_id: run_id.clone(),
            stages: stages.clone(),
        });

        let mut progress = ProgressMonitor::new(total_tasks, self.config.progress_bar);
        let mut tracker = DependencyTracker::new(&graph, self.config.failure_policy);
        let mut context = ExecutionContext::new(run_id.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut in_flight = FuturesUnordered::new();
        let mut completion_order = Vec::with_capacity(total_tasks);
        let mut first_failure: Option<String> = None;

        loop {
            for task_id in tracker.take_ready() {
                let Some(task) = graph.nodes.get(&task_id) else {
                    continue;
                };

                let upstream_keys = task
                    .dependencies
                    .iter()
                    .filter_map(|dep| graph.nodes.get(dep))
                    .map(|dep| dep.config.target_key.clone())
                    .collect();
                let task_context = context.for_task(&task_id, upstream_keys);

                tracing::debug!(run_id = %run_id, task_id = %task_id, "task launched");
                progress.add_task(&task_id, &task.name);
                self.emit(RenderEvent::TaskStart {
                    run_id: run_id.clone(),
                    task_id: task_id.clone(),
                    name: task.name.clone(),
                });

                in_flight.push(self.launch(task.clone(), task_context, semaphore.clone()));
            }

            if tracker.is_finished() {
                break;
            }
            let Some(finished) = in_flight.next().await else {
                break;
            };

            let success = finished.result.is_ok();
            let entry = match finished.result {
                Ok(output) => {
                    context.insert(finished.target_key.clone(), output.clone());
                    ExecutionLogEntry::completed(
                        &finished.task_id,
                        output,
                        stamp,
                        finished.duration_ms,
                    )
                }
                Err(error) => {
                    tracing::warn!(
                        run_id = %run_id,
                        task_id = %finished.task_id,
                        error = %error,
                        "task failed"
                    );
                    first_failure.get_or_insert_with(|| finished.task_id.clone());
                    ExecutionLogEntry::failed(&finished.task_id, error, stamp, finished.duration_ms)
                }
            };
            self.record(workflow, entry, &run_id, &mut progress, &mut completion_order);

            for (skipped, reason) in tracker.complete(&finished.task_id, success) {
                tracing::debug!(run_id = %run_id, task_id = %skipped, "task skipped");
                let entry = ExecutionLogEntry::failed(&skipped, reason, stamp, 0);
                self.record(workflow, entry, &run_id, &mut progress, &mut completion_order);
            }
        }

        let cause = first_failure.as_deref().unwrap_or("unknown task");
        let reason = if tracker.is_halted() {
            format!("cancelled: run halted after {cause} failed")
        } else {
            "cancelled: dependencies never completed".to_string()
        };
        for cancelled in tracker.drain_unfinished() {
            tracing::debug!(run_id = %run_id, task_id = %cancelled, "task cancelled");
            let reason = reason.clone();
            let entry = ExecutionLogEntry::failed(&cancelled, reason, stamp, 0);
            self.record(workflow, entry, &run_id, &mut progress, &mut completion_order);
        }

        let entries = workflow.run_entries();
        let completed = entries.iter().filter(|e| e.is_success()).count();
        let failed = entries.len() - completed;
        let final_status = if failed == 0 {
            WorkflowStatus::Completed
        } else {
            WorkflowStatus::Failed
        };

        workflow.transition_to(final_status)?;
        workflow.touch();
        progress.finish(final_status == WorkflowStatus::Completed);

        let report = RunReport {
            run_id: run_id.clone(),
            workflow_id: workflow.id.clone(),
            started_at: stamp,
            status: final_status,
            total_tasks,
            completed,
            failed,
            duration_ms: elapsed_ms(start),
            completion_order,
            stages,
        };

        tracing::info!(
            run_id = %run_id,
            workflow_id = %workflow.id,
            status = ?final_status,
            completed,
            failed,
            duration_ms = report.duration_ms,
            "workflow run finished"
        );

        self.emit(RenderEvent::RunEnd {
            run_id,
            report: report.clone(),
        });

        Ok(report)
    }

    fn claim(&self, workflow_id: &str) -> Result<ActiveRun<'_>, ExecutorError> {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if !active.insert(workflow_id.to_string()) {
            return Err(ExecutorError::AlreadyRunning(workflow_id.to_string()));
        }
        Ok(ActiveRun {
            active: &self.active,
            workflow_id: workflow_id.to_string(),
        })
    }

    /// Spawn one executor call. The call waits for a permit, is bounded by the
    /// task timeout, and a panic inside it is reported as a failure.
    fn launch(
        &self,
        task: Task,
        context: ExecutionContext,
        semaphore: Arc<Semaphore>,
    ) -> impl std::future::Future<Output = Finished> {
        let executor = self.executor.clone();
        let timeout = self.config.task_timeout();
        let task_id = task.id.clone();
        let target_key = task.config.target_key.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (Err("semaphore closed unexpectedly".to_string()), 0);
            };

            let started = Instant::now();
            let outcome = tokio::time::timeout(
                timeout,
                executor.execute(task.task_type, &task.config, &context),
            )
            .await;
            let duration_ms = elapsed_ms(started);

            let result = match outcome {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
            };
            (result, duration_ms)
        });

        async move {
            let (result, duration_ms) = match handle.await {
                Ok(done) => done,
                Err(join_err) => (Err(format!("task panicked: {join_err}")), 0),
            };
            Finished {
                task_id,
                target_key,
                result,
                duration_ms,
            }
        }
    }

    fn record(
        &self,
        workflow: &mut Workflow,
        entry: ExecutionLogEntry,
        run_id: &str,
        progress: &mut ProgressMonitor,
        completion_order: &mut Vec<String>,
    ) {
        progress.complete_task(&entry.task_id, entry.is_success(), entry.duration_ms);
        completion_order.push(entry.task_id.clone());
        self.emit(RenderEvent::TaskComplete {
            run_id: run_id.to_string(),
            entry: entry.clone(),
        });
        workflow.execution_log.push(entry);
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl SchedulerBuilder {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            executor,
            config: SchedulerConfig::default(),
            renderer: None,
        }
    }

    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler {
            executor: self.executor,
            config: self.config,
            renderer: self.renderer,
            active: Mutex::new(HashSet::new()),
        }
    }
}
