use serde::{Deserialize, Serialize};

use crate::graph::Point;

/// Inclusive zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self { min: 0.1, max: 3.0 }
    }
}

impl ZoomBounds {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Canvas container dimensions in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Translation plus uniform scale applied to canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// `((sx - vx) / vz, (sy - vy) / vz)`
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.zoom + self.x, canvas.y * self.zoom + self.y)
    }

    /// Pan at 1:1 screen speed, independent of zoom.
    pub fn pan_by(&mut self, screen_delta: Point) {
        self.x += screen_delta.x;
        self.y += screen_delta.y;
    }

    /// Apply a wheel delta anchored at the canvas origin. Returns true if zoom changed.
    /// Non-finite deltas are ignored.
    pub fn zoom_by(&mut self, wheel_delta: f64, sensitivity: f64, bounds: ZoomBounds) -> bool {
        if !wheel_delta.is_finite() {
            return false;
        }
        let next = bounds.clamp(self.zoom - wheel_delta * sensitivity);
        let changed = next != self.zoom;
        self.zoom = next;
        changed
    }

    /// Apply a wheel delta keeping the canvas point under `anchor` (screen space) fixed.
    pub fn zoom_at(
        &mut self,
        anchor: Point,
        wheel_delta: f64,
        sensitivity: f64,
        bounds: ZoomBounds,
    ) -> bool {
        if !anchor.is_finite() {
            return self.zoom_by(wheel_delta, sensitivity, bounds);
        }
        let pinned = self.screen_to_canvas(anchor);
        if !self.zoom_by(wheel_delta, sensitivity, bounds) {
            return false;
        }
        self.x = anchor.x - pinned.x * self.zoom;
        self.y = anchor.y - pinned.y * self.zoom;
        true
    }

    /// Canvas point at the middle of the visible area; new nodes are placed here.
    pub fn visible_center(&self, container: Size) -> Point {
        self.screen_to_canvas(Point::new(container.width / 2.0, container.height / 2.0))
    }
}
