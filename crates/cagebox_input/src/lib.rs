//! Pointer input for the cagebox sandbox
//!
//! This crate turns raw touch and mouse events into sandbox intents:
//! taps that select, long presses that drag, drags that orbit the camera,
//! and the cage-rotate gesture.

mod cage_rotate;
mod gesture;
mod interaction;
mod orbit_controller;
mod pointer;
mod timer;

pub use cage_rotate::CageRotateGesture;
pub use gesture::{
    GestureIntent, GesturePhase, PickHit, PickScene, PointerConfig, PointerInteractionProtocol, Viewport,
};
pub use interaction::{ActiveDrag, DragError, InteractionContext, PendingPick};
pub use orbit_controller::{CameraControl, OrbitController};
pub use pointer::{PointerEvent, PointerPhase, PointerTracker};
pub use timer::{DeferredTasks, TaskHandle};
