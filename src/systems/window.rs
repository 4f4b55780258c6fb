//! Window management system
//!
//! Handles window creation, fullscreen toggle, and the status title.

use std::sync::Arc;

use cagebox_core::{InstanceId, Vec3};
use cagebox_render::NavigationPhase;
use winit::{
    event_loop::ActiveEventLoop,
    window::{Fullscreen, Window},
};

use crate::config::WindowConfig;

/// Snapshot of sandbox state shown in the title bar
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitleStatus {
    pub selected: Option<InstanceId>,
    pub dragging: Option<InstanceId>,
    pub camera: Vec3,
    pub navigation: NavigationPhase,
    pub cage_rotate: bool,
    pub instances: usize,
}

/// Title text for a status snapshot
pub fn format_title(base: &str, status: &TitleStatus) -> String {
    let selected = status.selected.as_ref().map_or("none", |id| id.as_str());
    let mut title = format!(
        "{} - {} objects | selected: {} | camera ({:.1}, {:.1}, {:.1}) {:?}",
        base, status.instances, selected, status.camera.x, status.camera.y, status.camera.z, status.navigation
    );
    if let Some(id) = &status.dragging {
        title.push_str(&format!(" | dragging {}", id));
    }
    if status.cage_rotate {
        title.push_str(" [cage rotate]");
    }
    title
}

/// Manages the application window
pub struct WindowSystem {
    window: Arc<Window>,
    base_title: String,
}

impl WindowSystem {
    /// Create window from config
    pub fn create(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Self, WindowError> {
        let mut attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| WindowError::CreationFailed(e.to_string()))?,
        );

        Ok(Self {
            window,
            base_title: config.title.clone(),
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Surface size in physical pixels
    pub fn size(&self) -> (f32, f32) {
        let size = self.window.inner_size();
        (size.width as f32, size.height as f32)
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&self) {
        let new_fullscreen = if self.window.fullscreen().is_some() {
            None
        } else {
            Some(Fullscreen::Borderless(None))
        };
        self.window.set_fullscreen(new_fullscreen);
    }

    /// Update window title with selection/drag/camera state
    pub fn update_title(&self, status: &TitleStatus) {
        self.window.set_title(&format_title(&self.base_title, status));
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

#[derive(Debug)]
pub enum WindowError {
    CreationFailed(String),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::CreationFailed(msg) => write!(f, "Window creation failed: {}", msg),
        }
    }
}

impl std::error::Error for WindowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_idle() {
        let status = TitleStatus {
            camera: Vec3::new(0.0, 0.0, 8.0),
            ..TitleStatus::default()
        };
        let title = format_title("Cagebox", &status);
        assert_eq!(title, "Cagebox - 0 objects | selected: none | camera (0.0, 0.0, 8.0) Idle");
    }

    #[test]
    fn test_title_dragging_in_rotate_mode() {
        let status = TitleStatus {
            selected: Some(InstanceId::new("a")),
            dragging: Some(InstanceId::new("a")),
            navigation: NavigationPhase::Following,
            cage_rotate: true,
            instances: 3,
            ..TitleStatus::default()
        };
        let title = format_title("Cagebox", &status);
        assert!(title.contains("selected: a"));
        assert!(title.contains("dragging a"));
        assert!(title.contains("Following"));
        assert!(title.ends_with("[cage rotate]"));
    }
}
