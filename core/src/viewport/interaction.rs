use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;
use crate::graph::{ConnectOutcome, GraphModel, Point, TaskId};

use super::hit::NodeGeometry;
use super::transform::{Size, Viewport, ZoomBounds};

/// What the pointer is over, as classified by the host UI (or `NodeGeometry::hit_test`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "task", rename_all = "snake_case")]
pub enum PointerTarget {
    Background,
    NodeBody(TaskId),
    InputHandle(TaskId),
    OutputHandle(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub alt: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerDown {
    /// Screen point relative to the canvas container's top-left.
    pub position: Point,
    pub target: PointerTarget,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

impl PointerDown {
    pub fn primary(position: Point, target: PointerTarget) -> Self {
        Self {
            position,
            target,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    fn wants_pan(&self) -> bool {
        matches!(self.button, PointerButton::Middle | PointerButton::Secondary)
            || self.modifiers.alt
    }
}

/// At most one gesture is in flight at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Idle,
    Panning,
    DraggingNode(TaskId),
    /// `cursor` is the rubber-band endpoint in canvas space.
    Connecting { source: TaskId, cursor: Point },
}

/// What a pointer or wheel event changed.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEffect {
    None,
    Panned,
    Zoomed,
    NodeMoved(TaskId),
    ConnectPreview(Point),
    DragCommitted(TaskId),
    Connected { source: TaskId, target: TaskId },
    ConnectRejected {
        source: TaskId,
        target: TaskId,
        outcome: ConnectOutcome,
    },
    ConnectionDiscarded,
}

impl InteractionEffect {
    /// Gesture completions that must be made durable.
    pub fn requires_persist(&self) -> bool {
        matches!(
            self,
            InteractionEffect::DragCommitted(_) | InteractionEffect::Connected { .. }
        )
    }
}

/// Pan/zoom state plus the gesture state machine.
#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    state: InteractionState,
    selection: Option<TaskId>,
    /// Last known pointer position in screen space.
    pointer: Point,
    bounds: ZoomBounds,
    zoom_sensitivity: f64,
    zoom_to_cursor: bool,
    container: Size,
    geometry: NodeGeometry,
}

impl ViewportController {
    pub fn new(viewport: Viewport, cfg: &ViewportConfig) -> Self {
        let bounds = ZoomBounds {
            min: cfg.min_zoom,
            max: cfg.max_zoom,
        };
        let mut viewport = viewport;
        viewport.zoom = bounds.clamp(viewport.zoom);

        Self {
            viewport,
            state: InteractionState::Idle,
            selection: None,
            pointer: Point::ORIGIN,
            bounds,
            zoom_sensitivity: cfg.zoom_sensitivity,
            zoom_to_cursor: cfg.zoom_to_cursor,
            container: Size::new(cfg.container_width, cfg.container_height),
            geometry: NodeGeometry::default(),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selection(&self) -> Option<&TaskId> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, id: Option<TaskId>) {
        self.selection = id;
    }

    pub fn geometry(&self) -> NodeGeometry {
        self.geometry
    }

    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.viewport.screen_to_canvas(screen)
    }

    /// Canvas point at the centre of the visible area.
    pub fn visible_center(&self) -> Point {
        self.viewport.visible_center(self.container)
    }

    /// Hit-test a screen point against the graph.
    pub fn classify(&self, graph: &GraphModel, screen: Point) -> PointerTarget {
        self.geometry
            .hit_test(graph, self.viewport.screen_to_canvas(screen))
    }

    /// Source task and canvas endpoint of the pending connection, if any.
    pub fn rubber_band(&self) -> Option<(&TaskId, Point)> {
        match &self.state {
            InteractionState::Connecting { source, cursor } => Some((source, *cursor)),
            _ => None,
        }
    }

    /// Drop any gesture or selection that refers to a removed task.
    pub fn forget_task(&mut self, id: &str) {
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        let stale = match &self.state {
            InteractionState::DraggingNode(task) => task == id,
            InteractionState::Connecting { source, .. } => source == id,
            _ => false,
        };
        if stale {
            self.state = InteractionState::Idle;
        }
    }

    /// Classify a pointer-down. Precedence: output handle, node body, pan, idle.
    pub fn pointer_down(&mut self, event: PointerDown) -> &InteractionState {
        self.pointer = event.position;

        self.state = match &event.target {
            PointerTarget::OutputHandle(id) => InteractionState::Connecting {
                source: id.clone(),
                cursor: self.viewport.screen_to_canvas(event.position),
            },
            PointerTarget::NodeBody(id) => {
                self.selection = Some(id.clone());
                InteractionState::DraggingNode(id.clone())
            }
            target if *target == PointerTarget::Background || event.wants_pan() => {
                self.selection = None;
                InteractionState::Panning
            }
            _ => InteractionState::Idle,
        };

        tracing::trace!(state = ?self.state, "pointer down");
        &self.state
    }

    /// Apply a screen-space pointer movement. Non-finite deltas change nothing.
    pub fn pointer_move(&mut self, graph: &mut GraphModel, screen_delta: Point) -> InteractionEffect {
        if !screen_delta.is_finite() {
            tracing::debug!(delta = ?screen_delta, "ignoring non-finite pointer delta");
            return InteractionEffect::None;
        }
        self.pointer = self.pointer + screen_delta;

        match &mut self.state {
            InteractionState::Idle => InteractionEffect::None,
            InteractionState::Panning => {
                self.viewport.pan_by(screen_delta);
                InteractionEffect::Panned
            }
            InteractionState::DraggingNode(id) => {
                let Some(task) = graph.get(id) else {
                    return InteractionEffect::None;
                };
                // canvas-space delta so the node tracks the cursor at any zoom
                let position = task.position + screen_delta.scale(1.0 / self.viewport.zoom);
                graph.set_position(id, position);
                InteractionEffect::NodeMoved(id.clone())
            }
            InteractionState::Connecting { cursor, .. } => {
                *cursor = self.viewport.screen_to_canvas(self.pointer);
                InteractionEffect::ConnectPreview(*cursor)
            }
        }
    }

    /// Finish the current gesture. Always returns to `Idle`.
    pub fn pointer_up(&mut self, graph: &mut GraphModel, release: &PointerTarget) -> InteractionEffect {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);

        match state {
            InteractionState::Idle | InteractionState::Panning => InteractionEffect::None,
            InteractionState::DraggingNode(id) => {
                if graph.contains(&id) {
                    InteractionEffect::DragCommitted(id)
                } else {
                    InteractionEffect::None
                }
            }
            InteractionState::Connecting { source, .. } => {
                let PointerTarget::InputHandle(target) = release else {
                    return InteractionEffect::ConnectionDiscarded;
                };
                let outcome = graph.connect(&source, target);
                if outcome.is_connected() {
                    tracing::debug!(source = %source, target = %target, "tasks connected");
                    InteractionEffect::Connected {
                        source,
                        target: target.clone(),
                    }
                } else {
                    tracing::warn!(
                        source = %source,
                        target = %target,
                        reason = outcome.reason(),
                        "connection rejected"
                    );
                    InteractionEffect::ConnectRejected {
                        source,
                        target: target.clone(),
                        outcome,
                    }
                }
            }
        }
    }

    /// Adjust zoom by a wheel delta, clamped to the configured range.
    pub fn wheel(&mut self, delta: f64) -> InteractionEffect {
        if !delta.is_finite() {
            tracing::debug!(delta, "ignoring non-finite wheel delta");
            return InteractionEffect::None;
        }
        let changed = if self.zoom_to_cursor {
            self.viewport
                .zoom_at(self.pointer, delta, self.zoom_sensitivity, self.bounds)
        } else {
            self.viewport
                .zoom_by(delta, self.zoom_sensitivity, self.bounds)
        };

        if changed {
            InteractionEffect::Zoomed
        } else {
            InteractionEffect::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TaskType;

    fn controller(zoom: f64) -> ViewportController {
        ViewportController::new(Viewport::new(0.0, 0.0, zoom), &ViewportConfig::default())
    }

    fn two_tasks() -> (GraphModel, TaskId, TaskId) {
        let mut graph = GraphModel::new();
        let a = graph.add_task(TaskType::Input, Point::ORIGIN, None).id;
        let b = graph
            .add_task(TaskType::Generation, Point::new(300.0, 0.0), None)
            .id;
        (graph, a, b)
    }

    #[test]
    fn test_pointer_down_precedence() {
        let mut ctl = controller(1.0);

        let state = ctl.pointer_down(PointerDown::primary(
            Point::ORIGIN,
            PointerTarget::OutputHandle("a".into()),
        ));
        assert!(matches!(state, InteractionState::Connecting { source, .. } if source == "a"));

        ctl.pointer_down(PointerDown::primary(
            Point::ORIGIN,
            PointerTarget::NodeBody("b".into()),
        ));
        assert_eq!(ctl.state(), &InteractionState::DraggingNode("b".into()));
        assert_eq!(ctl.selection().map(String::as_str), Some("b"));

        ctl.pointer_down(PointerDown::primary(Point::ORIGIN, PointerTarget::Background));
        assert_eq!(ctl.state(), &InteractionState::Panning);
        assert_eq!(ctl.selection(), None);

        ctl.pointer_down(PointerDown::primary(
            Point::ORIGIN,
            PointerTarget::InputHandle("a".into()),
        ));
        assert_eq!(ctl.state(), &InteractionState::Idle);

        let mut alt = PointerDown::primary(Point::ORIGIN, PointerTarget::InputHandle("a".into()));
        alt.modifiers.alt = true;
        ctl.pointer_down(alt);
        assert_eq!(ctl.state(), &InteractionState::Panning);
    }

    #[test]
    fn test_pan_is_not_scaled_by_zoom() {
        let mut ctl = controller(2.0);
        let mut graph = GraphModel::new();

        ctl.pointer_down(PointerDown {
            position: Point::ORIGIN,
            target: PointerTarget::NodeBody("ignored".into()),
            button: PointerButton::Middle,
            modifiers: Modifiers::default(),
        });
        // node body wins over the pan modifier
        assert_eq!(ctl.state(), &InteractionState::DraggingNode("ignored".into()));

        ctl.pointer_down(PointerDown::primary(Point::ORIGIN, PointerTarget::Background));
        assert_eq!(
            ctl.pointer_move(&mut graph, Point::new(30.0, -10.0)),
            InteractionEffect::Panned
        );
        assert_eq!(ctl.viewport(), Viewport::new(30.0, -10.0, 2.0));
        assert_eq!(
            ctl.pointer_up(&mut graph, &PointerTarget::Background),
            InteractionEffect::None
        );
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_drag_divides_by_zoom() {
        for (zoom, expected) in [(1.0, Point::new(40.0, 20.0)), (2.0, Point::new(20.0, 10.0))] {
            let mut ctl = controller(zoom);
            let (mut graph, a, _) = two_tasks();

            ctl.pointer_down(PointerDown::primary(
                Point::new(10.0, 10.0),
                PointerTarget::NodeBody(a.clone()),
            ));
            assert_eq!(
                ctl.pointer_move(&mut graph, Point::new(40.0, 20.0)),
                InteractionEffect::NodeMoved(a.clone())
            );
            assert_eq!(graph.get(&a).unwrap().position, expected);

            let effect = ctl.pointer_up(&mut graph, &PointerTarget::Background);
            assert_eq!(effect, InteractionEffect::DragCommitted(a));
            assert!(effect.requires_persist());
        }
    }

    #[test]
    fn test_connect_gesture() {
        let mut ctl = controller(2.0);
        let (mut graph, a, b) = two_tasks();

        ctl.pointer_down(PointerDown::primary(
            Point::new(100.0, 40.0),
            PointerTarget::OutputHandle(a.clone()),
        ));
        let effect = ctl.pointer_move(&mut graph, Point::new(100.0, 0.0));
        assert_eq!(effect, InteractionEffect::ConnectPreview(Point::new(100.0, 20.0)));
        assert_eq!(ctl.rubber_band(), Some((&a, Point::new(100.0, 20.0))));
        // no model mutation while connecting
        assert!(graph.get(&b).unwrap().dependencies.is_empty());

        let effect = ctl.pointer_up(&mut graph, &PointerTarget::InputHandle(b.clone()));
        assert_eq!(
            effect,
            InteractionEffect::Connected {
                source: a.clone(),
                target: b.clone()
            }
        );
        assert!(effect.requires_persist());
        assert_eq!(graph.get(&b).unwrap().dependencies, vec![a.clone()]);

        // reverse edge would close a cycle
        ctl.pointer_down(PointerDown::primary(
            Point::ORIGIN,
            PointerTarget::OutputHandle(b.clone()),
        ));
        let effect = ctl.pointer_up(&mut graph, &PointerTarget::InputHandle(a.clone()));
        assert!(matches!(
            effect,
            InteractionEffect::ConnectRejected {
                outcome: ConnectOutcome::WouldCycle,
                ..
            }
        ));
        assert!(!effect.requires_persist());
    }

    #[test]
    fn test_connect_released_elsewhere_is_discarded() {
        let mut ctl = controller(1.0);
        let (mut graph, a, b) = two_tasks();
        let before = graph.clone();

        ctl.pointer_down(PointerDown::primary(
            Point::ORIGIN,
            PointerTarget::OutputHandle(a),
        ));
        let effect = ctl.pointer_up(&mut graph, &PointerTarget::NodeBody(b));
        assert_eq!(effect, InteractionEffect::ConnectionDiscarded);
        assert_eq!(graph, before);
        assert_eq!(ctl.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_wheel_zoom_clamps() {
        let mut ctl = controller(1.0);
        assert_eq!(ctl.wheel(-1_000_000.0), InteractionEffect::Zoomed);
        assert_eq!(ctl.viewport().zoom, 3.0);
        assert_eq!(ctl.wheel(-1.0), InteractionEffect::None);
        ctl.wheel(1_000_000.0);
        assert_eq!(ctl.viewport().zoom, 0.1);
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut ctl = controller(1.0);
        let (mut graph, a, _) = two_tasks();

        assert_eq!(ctl.wheel(f64::NAN), InteractionEffect::None);
        assert_eq!(ctl.wheel(f64::INFINITY), InteractionEffect::None);
        assert_eq!(ctl.viewport().zoom, 1.0);

        ctl.pointer_down(PointerDown::primary(Point::ORIGIN, PointerTarget::Background));
        assert_eq!(
            ctl.pointer_move(&mut graph, Point::new(f64::NAN, 5.0)),
            InteractionEffect::None
        );
        assert_eq!(ctl.viewport(), Viewport::new(0.0, 0.0, 1.0));
        ctl.pointer_up(&mut graph, &PointerTarget::Background);

        ctl.pointer_down(PointerDown::primary(Point::ORIGIN, PointerTarget::NodeBody(a.clone())));
        assert_eq!(
            ctl.pointer_move(&mut graph, Point::new(1.0, f64::NEG_INFINITY)),
            InteractionEffect::None
        );
        assert_eq!(graph.get(&a).unwrap().position, Point::ORIGIN);
    }

    #[test]
    fn test_zoom_to_cursor_with_non_finite_pointer_keeps_viewport_finite() {
        let cfg = ViewportConfig {
            zoom_to_cursor: true,
            ..ViewportConfig::default()
        };
        let mut ctl = ViewportController::new(Viewport::default(), &cfg);
        ctl.pointer_down(PointerDown::primary(
            Point::new(f64::NAN, 0.0),
            PointerTarget::Background,
        ));
        assert_eq!(ctl.wheel(-100.0), InteractionEffect::Zoomed);
        let vp = ctl.viewport();
        assert!(vp.x.is_finite() && vp.y.is_finite() && vp.zoom.is_finite());
    }

    #[test]
    fn test_forget_task_cancels_drag() {
        let mut ctl = controller(1.0);
        ctl.pointer_down(PointerDown::primary(
            Point::ORIGIN,
            PointerTarget::NodeBody("a".into()),
        ));
        ctl.forget_task("a");
        assert_eq!(ctl.state(), &InteractionState::Idle);
        assert_eq!(ctl.selection(), None);
    }

    #[test]
    fn test_classify_uses_canvas_space() {
        let mut ctl = controller(2.0);
        let (graph, _, b) = two_tasks();
        // b's body spans canvas x 300..500, i.e. screen x 600..1000 at zoom 2
        assert_eq!(
            ctl.classify(&graph, Point::new(700.0, 40.0)),
            PointerTarget::NodeBody(b)
        );
        ctl.set_container(Size::new(400.0, 200.0));
        assert_eq!(ctl.visible_center(), Point::new(100.0, 50.0));
    }
}
