//! Application systems
//!
//! Modular systems extracted from main.rs for better organization and testability.

mod drag;
mod simulation;
mod window;

pub use drag::{DragConfig, DragSolver, ScenePicker};
pub use simulation::{FrameReport, SimulationSystem};
pub use window::{format_title, TitleStatus, WindowError, WindowSystem};
