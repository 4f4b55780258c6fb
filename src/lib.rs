//! Cagebox - touch-driven physics sandbox
//!
//! Shapes fall into a walled cage under gravity. A tap selects a shape and
//! eases the camera toward it, a long press drags it across the floor, and
//! a free drag orbits the camera. This crate wires the library crates into
//! a frame loop; `main.rs` hosts it in a winit window.

pub mod config;
pub mod input;
pub mod scene;
pub mod systems;
