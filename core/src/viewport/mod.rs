//! Screen/canvas coordinate transform and the pointer interaction state machine.
//!
//! The controller is driven by framework-neutral events: `pointer_down`,
//! `pointer_move`, `pointer_up` and `wheel`. It is the only place that mutates
//! node positions during a drag, and it never persists anything itself; it
//! reports which gestures completed so the caller can save.

mod hit;
mod interaction;
mod transform;

pub use hit::NodeGeometry;
pub use interaction::{
    InteractionEffect, InteractionState, Modifiers, PointerButton, PointerDown, PointerTarget,
    ViewportController,
};
pub use transform::{Size, Viewport, ZoomBounds};
