mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use canvasflow_core::config::ViewportConfig;
use canvasflow_core::executor::SchedulerConfig;
use canvasflow_core::graph::{Point, TaskType};
use canvasflow_core::viewport::{
    InteractionEffect, InteractionState, Modifiers, PointerButton, PointerTarget,
};
use canvasflow_core::workflow::WorkflowStatus;
use canvasflow_core::{GraphStore, WorkflowEditor};

use common::{scheduler, MemoryStore, ScriptedExecutor};

async fn editor_with_store() -> (WorkflowEditor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let editor = WorkflowEditor::create("canvas", store.clone(), &ViewportConfig::default())
        .await
        .unwrap();
    (editor, store)
}

#[tokio::test]
async fn connecting_by_handles_persists_the_edge() {
    let (mut ed, store) = editor_with_store().await;

    let source = ed.add_task(TaskType::Input).await.unwrap();
    ed.controller_mut().select(None);
    let target = ed.add_task(TaskType::Generation).await.unwrap();
    assert!(target.dependencies.is_empty());

    // both land at the same spot; move the target right so the handles are distinct
    let body = Point::new(source.position.x + 100.0, source.position.y + 40.0);
    let state = ed.pointer_down_at(body, PointerButton::Primary, Modifiers::default());
    assert_eq!(state, InteractionState::DraggingNode(target.id.clone()));
    ed.pointer_move(Point::new(400.0, 0.0));
    ed.pointer_up(&PointerTarget::Background).await.unwrap();

    let geometry = ed.controller().geometry();
    let out_handle = geometry.output_handle(source.position);
    let target_pos = ed.workflow().graph.get(&target.id).unwrap().position;
    let in_handle = geometry.input_handle(target_pos);

    let saves_before = store.saves();
    let state = ed.pointer_down_at(out_handle, PointerButton::Primary, Modifiers::default());
    assert!(matches!(state, InteractionState::Connecting { .. }));

    let preview = ed.pointer_move(in_handle - out_handle);
    assert_eq!(preview, InteractionEffect::ConnectPreview(in_handle));
    assert_eq!(store.saves(), saves_before);

    let effect = ed.pointer_up_at(in_handle).await.unwrap();
    assert_eq!(
        effect,
        InteractionEffect::Connected {
            source: source.id.clone(),
            target: target.id.clone(),
        }
    );
    assert_eq!(store.saves(), saves_before + 1);
    assert_eq!(ed.controller().state(), &InteractionState::Idle);

    let stored = store.get(&ed.workflow().id).unwrap();
    assert_eq!(
        stored.graph.get(&target.id).unwrap().dependencies,
        vec![source.id.clone()]
    );
}

#[tokio::test]
async fn pan_and_zoom_are_flushed_not_saved() {
    let (mut ed, store) = editor_with_store().await;
    let saves_before = store.saves();

    let state = ed.pointer_down_at(Point::new(5.0, 5.0), PointerButton::Primary, Modifiers::default());
    assert_eq!(state, InteractionState::Panning);
    assert_eq!(ed.pointer_move(Point::new(30.0, -10.0)), InteractionEffect::Panned);
    ed.pointer_up(&PointerTarget::Background).await.unwrap();
    assert_eq!(ed.wheel(-500.0), InteractionEffect::Zoomed);

    assert_eq!(store.saves(), saves_before);
    assert!(ed.is_dirty());

    ed.flush().await.unwrap();
    let stored = store.get(&ed.workflow().id).unwrap();
    assert_eq!(stored.viewport.x, 30.0);
    assert_eq!(stored.viewport.y, -10.0);
    assert!((stored.viewport.zoom - 1.5).abs() < 1e-9);
}

#[tokio::test]
async fn run_through_editor_saves_log_and_status() {
    let (mut ed, store) = editor_with_store().await;
    ed.add_task(TaskType::Input).await.unwrap();
    ed.add_task(TaskType::Generation).await.unwrap();
    ed.add_task(TaskType::Analysis).await.unwrap();

    let sched = scheduler(ScriptedExecutor::new(), SchedulerConfig::default());
    let report = ed.run(&sched).await.unwrap();
    assert!(report.succeeded());

    let stored = store.get(&ed.workflow().id).unwrap();
    assert_eq!(stored.status, WorkflowStatus::Completed);
    assert_eq!(stored.execution_log.len(), 3);
    assert_eq!(stored.last_run, ed.workflow().last_run);
}

#[test]
fn reopened_workflow_round_trips_through_the_store() {
    tokio_test::block_on(async {
        let (mut ed, store) = editor_with_store().await;
        let task = ed.add_task(TaskType::HumanReview).await.unwrap();
        let id = ed.workflow().id.clone();

        let reopened = WorkflowEditor::open(&id, store.clone(), &ViewportConfig::default())
            .await
            .unwrap();
        assert_eq!(reopened.workflow(), ed.workflow());
        assert!(reopened.workflow().graph.contains(&task.id));

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].task_count, 1);
    });
}
