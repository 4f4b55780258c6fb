//! Camera and selection visuals for the cagebox sandbox
//!
//! There is no GPU pipeline here; drawing belongs to the external renderer.
//! This crate produces what the renderer consumes:
//!
//! - [`camera::Camera`] - Perspective camera, picking rays and uniforms
//! - [`navigator::CameraNavigator`] - Eased focus transitions and orbiting
//! - [`highlight::SelectionHighlights`] - Per-instance glow uniforms

pub mod camera;
pub mod highlight;
pub mod navigator;

pub use camera::{Camera, CameraUniforms};
pub use highlight::{switch_highlight, HighlightSink, HighlightUniforms, SelectionHighlights};
pub use navigator::{ease_in_out_cubic, CameraNavigator, FocusState, NavigationPhase, NavigatorConfig, Transition};
