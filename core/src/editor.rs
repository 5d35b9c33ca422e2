use std::sync::Arc;

use crate::config::ViewportConfig;
use crate::error::{EditorError, StoreError};
use crate::executor::{RunReport, Scheduler};
use crate::graph::{ConnectOutcome, Point, Task, TaskPatch, TaskType};
use crate::store::GraphStore;
use crate::viewport::{
    InteractionEffect, InteractionState, Modifiers, PointerButton, PointerDown, PointerTarget,
    ViewportController,
};
use crate::workflow::Workflow;

/// One open workflow: the graph, its canvas controller and the store it
/// persists to.
///
/// Discrete edits and completed gestures are saved immediately. Per-frame
/// changes (drag frames, pans, zooms) only mark the editor dirty; `flush`
/// writes them. A failed save keeps the in-memory workflow and leaves the
/// editor dirty so the next save or `flush` retries.
pub struct WorkflowEditor {
    workflow: Workflow,
    controller: ViewportController,
    store: Arc<dyn GraphStore>,
    dirty: bool,
}

impl WorkflowEditor {
    /// Start a new, empty workflow and save it.
    pub async fn create(
        name: impl Into<String>,
        store: Arc<dyn GraphStore>,
        cfg: &ViewportConfig,
    ) -> Result<Self, EditorError> {
        let workflow = Workflow::new(name);
        let mut editor = Self::from_workflow(workflow, store, cfg);
        editor.dirty = true;
        editor.persist().await?;
        Ok(editor)
    }

    /// Load a stored workflow. A workflow left RUNNING by an interrupted
    /// process is marked FAILED.
    pub async fn open(
        workflow_id: &str,
        store: Arc<dyn GraphStore>,
        cfg: &ViewportConfig,
    ) -> Result<Self, StoreError> {
        let mut workflow = store.load(workflow_id).await?;
        let recovered = workflow.recover_interrupted();
        let mut editor = Self::from_workflow(workflow, store, cfg);

        if recovered {
            tracing::warn!(workflow_id = %workflow_id, "interrupted run marked failed");
            editor.dirty = true;
            if let Err(e) = editor.persist().await {
                tracing::warn!(workflow_id = %workflow_id, error = %e, "could not save recovered status");
            }
        }

        Ok(editor)
    }

    pub fn from_workflow(
        workflow: Workflow,
        store: Arc<dyn GraphStore>,
        cfg: &ViewportConfig,
    ) -> Self {
        let controller = ViewportController::new(workflow.viewport, cfg);
        Self {
            workflow,
            controller,
            store,
            dirty: false,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ViewportController {
        &mut self.controller
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn into_workflow(self) -> Workflow {
        self.workflow
    }

    // ---- discrete edits ----

    /// Add a task centred in the visible area. If a task is selected the new
    /// one depends on it. The new task becomes the selection.
    pub async fn add_task(&mut self, task_type: TaskType) -> Result<Task, EditorError> {
        let geometry = self.controller.geometry();
        let position = self.controller.visible_center()
            - Point::new(geometry.width / 2.0, geometry.height / 2.0);
        let from = self.controller.selection().cloned();

        let task = self
            .workflow
            .graph
            .add_task(task_type, position, from.as_deref());
        self.controller.select(Some(task.id.clone()));

        self.mark_changed();
        self.persist().await?;
        Ok(task)
    }

    /// Remove a task and every edge that references it. No-op for unknown ids.
    pub async fn remove_task(&mut self, task_id: &str) -> Result<Option<Task>, EditorError> {
        let Some(task) = self.workflow.graph.remove_task(task_id) else {
            return Ok(None);
        };
        self.controller.forget_task(task_id);

        self.mark_changed();
        self.persist().await?;
        Ok(Some(task))
    }

    pub async fn update_task(&mut self, task_id: &str, patch: TaskPatch) -> Result<(), EditorError> {
        if !self.workflow.graph.contains(task_id) {
            return Err(EditorError::UnknownTask(task_id.to_string()));
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.workflow.graph.update_task(task_id, patch);

        self.mark_changed();
        self.persist().await
    }

    /// Make `target` depend on `source`. Rejected connections change nothing
    /// and are not saved.
    pub async fn connect(&mut self, source: &str, target: &str) -> Result<ConnectOutcome, EditorError> {
        let outcome = self.workflow.graph.connect(source, target);
        if !outcome.is_connected() {
            tracing::warn!(source = %source, target = %target, reason = outcome.reason(), "connection rejected");
            return Ok(outcome);
        }

        self.mark_changed();
        self.persist().await?;
        Ok(outcome)
    }

    pub async fn disconnect(&mut self, source: &str, target: &str) -> Result<bool, EditorError> {
        if !self.workflow.graph.disconnect(source, target) {
            return Ok(false);
        }

        self.mark_changed();
        self.persist().await?;
        Ok(true)
    }

    // ---- gestures ----

    pub fn pointer_down(&mut self, event: PointerDown) -> InteractionState {
        self.controller.pointer_down(event).clone()
    }

    /// Pointer-down at a screen point, hit-tested against the graph.
    pub fn pointer_down_at(
        &mut self,
        position: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> InteractionState {
        let target = self.controller.classify(&self.workflow.graph, position);
        self.pointer_down(PointerDown {
            position,
            target,
            button,
            modifiers,
        })
    }

    pub fn pointer_move(&mut self, screen_delta: Point) -> InteractionEffect {
        let effect = self
            .controller
            .pointer_move(&mut self.workflow.graph, screen_delta);
        if matches!(effect, InteractionEffect::NodeMoved(_) | InteractionEffect::Panned) {
            self.dirty = true;
        }
        effect
    }

    /// Finish the gesture; drag releases and new connections are saved.
    pub async fn pointer_up(&mut self, release: &PointerTarget) -> Result<InteractionEffect, EditorError> {
        let effect = self
            .controller
            .pointer_up(&mut self.workflow.graph, release);

        if effect.requires_persist() {
            self.mark_changed();
            self.persist().await?;
        }
        Ok(effect)
    }

    /// Pointer-up at a screen point, hit-tested against the graph.
    pub async fn pointer_up_at(&mut self, position: Point) -> Result<InteractionEffect, EditorError> {
        let release = self.controller.classify(&self.workflow.graph, position);
        self.pointer_up(&release).await
    }

    pub fn wheel(&mut self, delta: f64) -> InteractionEffect {
        let effect = self.controller.wheel(delta);
        if effect == InteractionEffect::Zoomed {
            self.dirty = true;
        }
        effect
    }

    // ---- persistence and runs ----

    /// Save pending changes, if any.
    pub async fn flush(&mut self) -> Result<(), EditorError> {
        if !self.dirty {
            return Ok(());
        }
        self.workflow.touch();
        self.persist().await
    }

    /// Run the workflow and save the resulting log and status.
    pub async fn run(&mut self, scheduler: &Scheduler) -> Result<RunReport, EditorError> {
        let report = scheduler.run(&mut self.workflow).await?;
        self.dirty = true;
        self.persist().await?;
        Ok(report)
    }

    fn mark_changed(&mut self) {
        self.workflow.touch();
        self.dirty = true;
    }

    async fn persist(&mut self) -> Result<(), EditorError> {
        self.workflow.viewport = self.controller.viewport();

        match self.store.save(&self.workflow).await {
            Ok(()) => {
                self.dirty = false;
                tracing::debug!(workflow_id = %self.workflow.id, store = self.store.name(), "workflow saved");
                Ok(())
            }
            Err(source) => {
                self.dirty = true;
                tracing::warn!(workflow_id = %self.workflow.id, error = %source, "failed to save workflow");
                Err(EditorError::Persist {
                    workflow_id: self.workflow.id.clone(),
                    source,
                })
            }
        }
    }
}
