use serde::{Deserialize, Serialize};

use crate::graph::{GraphModel, Point};

use super::interaction::PointerTarget;

/// Node box and handle sizes in canvas units.
///
/// The input handle sits on the middle of the left edge, the output handle on
/// the middle of the right edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeGeometry {
    pub width: f64,
    pub height: f64,
    pub handle_radius: f64,
}

impl Default for NodeGeometry {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 80.0,
            handle_radius: 8.0,
        }
    }
}

impl NodeGeometry {
    pub fn input_handle(&self, position: Point) -> Point {
        Point::new(position.x, position.y + self.height / 2.0)
    }

    pub fn output_handle(&self, position: Point) -> Point {
        Point::new(position.x + self.width, position.y + self.height / 2.0)
    }

    fn contains(&self, position: Point, point: Point) -> bool {
        point.x >= position.x
            && point.x <= position.x + self.width
            && point.y >= position.y
            && point.y <= position.y + self.height
    }

    /// Classify a canvas-space point. Later tasks are drawn on top, so they win.
    pub fn hit_test(&self, graph: &GraphModel, canvas: Point) -> PointerTarget {
        for task in graph.tasks().iter().rev() {
            if self.output_handle(task.position).distance_to(canvas) <= self.handle_radius {
                return PointerTarget::OutputHandle(task.id.clone());
            }
            if self.input_handle(task.position).distance_to(canvas) <= self.handle_radius {
                return PointerTarget::InputHandle(task.id.clone());
            }
            if self.contains(task.position, canvas) {
                return PointerTarget::NodeBody(task.id.clone());
            }
        }
        PointerTarget::Background
    }
}
