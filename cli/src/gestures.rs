//! Scripted canvas gestures, one JSON object per line:
//!
//! ```text
//! {"event":"resize","width":800,"height":600}
//! {"event":"add","task_type":"INPUT"}
//! {"event":"down","x":140,"y":70}
//! {"event":"move","dx":25,"dy":0}
//! {"event":"up","x":165,"y":70}
//! {"event":"wheel","delta":-120}
//! ```
//!
//! Positions are screen points; hit-testing uses the editor's node geometry.

use serde::Deserialize;

use canvasflow_core::error::{CliError, EditorError};
use canvasflow_core::graph::{Point, TaskType};
use canvasflow_core::viewport::{InteractionEffect, Modifiers, PointerButton, Size};
use canvasflow_core::WorkflowEditor;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GestureEvent {
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        alt: bool,
    },
    Move {
        dx: f64,
        dy: f64,
    },
    Up {
        x: f64,
        y: f64,
    },
    Wheel {
        delta: f64,
    },
    Add {
        task_type: TaskType,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

/// Parse a JSONL script. Blank lines and `#` comments are skipped.
pub fn parse_script(script: &str) -> Result<Vec<GestureEvent>, CliError> {
    script
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::Command(format!("gesture script line {}: {e}", idx + 1)))
        })
        .collect()
}

/// Short human-readable form of an effect.
pub fn describe(effect: &InteractionEffect) -> String {
    match effect {
        InteractionEffect::None => "none".to_string(),
        InteractionEffect::Panned => "panned".to_string(),
        InteractionEffect::Zoomed => "zoomed".to_string(),
        InteractionEffect::NodeMoved(id) => format!("moved {id}"),
        InteractionEffect::ConnectPreview(p) => format!("connecting to ({:.1}, {:.1})", p.x, p.y),
        InteractionEffect::DragCommitted(id) => format!("dropped {id}"),
        InteractionEffect::Connected { source, target } => format!("connected {source} -> {target}"),
        InteractionEffect::ConnectRejected {
            source,
            target,
            outcome,
        } => format!("rejected {source} -> {target}: {}", outcome.reason()),
        InteractionEffect::ConnectionDiscarded => "connection discarded".to_string(),
    }
}

/// Feed `events` through the editor, then flush pending viewport changes.
/// Returns one description per event.
pub async fn replay(
    editor: &mut WorkflowEditor,
    events: &[GestureEvent],
) -> Result<Vec<String>, EditorError> {
    let mut log = Vec::with_capacity(events.len());

    for event in events {
        let line = match event {
            GestureEvent::Down { x, y, button, alt } => {
                let state =
                    editor.pointer_down_at(Point::new(*x, *y), *button, Modifiers { alt: *alt });
                format!("down -> {state:?}")
            }
            GestureEvent::Move { dx, dy } => describe(&editor.pointer_move(Point::new(*dx, *dy))),
            GestureEvent::Up { x, y } => describe(&editor.pointer_up_at(Point::new(*x, *y)).await?),
            GestureEvent::Wheel { delta } => describe(&editor.wheel(*delta)),
            GestureEvent::Add { task_type } => {
                let task = editor.add_task(*task_type).await?;
                format!("added {} ({})", task.id, task.task_type)
            }
            GestureEvent::Resize { width, height } => {
                editor
                    .controller_mut()
                    .set_container(Size::new(*width, *height));
                format!("container {width}x{height}")
            }
        };
        tracing::debug!(gesture = %line, "replayed");
        log.push(line);
    }

    editor.flush().await?;
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use canvasflow_core::config::ViewportConfig;
    use canvasflow_core::viewport::InteractionState;
    use canvasflow_core::GraphStore;
    use canvasflow_plugins::store::InMemoryGraphStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_script_skips_comments_and_reports_line() {
        let events = parse_script(
            "# setup\n{\"event\":\"add\",\"task_type\":\"ANALYSIS\"}\n\n{\"event\":\"wheel\",\"delta\":-50}\n",
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                GestureEvent::Add {
                    task_type: TaskType::Analysis
                },
                GestureEvent::Wheel { delta: -50.0 },
            ]
        );

        let err = parse_script("{\"event\":\"wheel\",\"delta\":1}\n{\"event\":\"fly\"}").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_replay_drags_node_and_flushes_pan() {
        let store = Arc::new(InMemoryGraphStore::new());
        let cfg = ViewportConfig::default();
        let mut editor = WorkflowEditor::create("replay", store.clone(), &cfg)
            .await
            .unwrap();

        let task = editor.add_task(TaskType::Input).await.unwrap();
        let geometry = editor.controller().geometry();
        let body = editor
            .controller()
            .viewport()
            .canvas_to_screen(task.position + Point::new(geometry.width / 2.0, geometry.height / 2.0));

        let events = vec![
            GestureEvent::Down {
                x: body.x,
                y: body.y,
                button: PointerButton::Primary,
                alt: false,
            },
            GestureEvent::Move { dx: 30.0, dy: 10.0 },
            GestureEvent::Up {
                x: body.x + 30.0,
                y: body.y + 10.0,
            },
            GestureEvent::Down {
                x: 5.0,
                y: 5.0,
                button: PointerButton::Middle,
                alt: false,
            },
            GestureEvent::Move { dx: -40.0, dy: 0.0 },
            GestureEvent::Up { x: -35.0, y: 5.0 },
        ];

        let log = replay(&mut editor, &events).await.unwrap();
        assert_eq!(log[2], format!("dropped {}", task.id));
        assert_eq!(log[4], "panned");
        assert_eq!(editor.controller().state(), &InteractionState::Idle);
        assert!(!editor.is_dirty());

        let saved = store.load(&editor.workflow().id).await.unwrap();
        let moved = saved.graph.get(&task.id).unwrap();
        assert_eq!(moved.position, task.position + Point::new(30.0, 10.0));
        assert_eq!(saved.viewport.x, -40.0);
    }
}
