//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. Built-in defaults
//! 2. `config/default.toml` (version controlled)
//! 3. `config/user.toml` (gitignored, user overrides)
//! 4. Environment variables (`CAGEBOX_SECTION__KEY`)

use std::path::Path;
use std::time::Duration;

use cagebox_core::CageDimensions;
use cagebox_input::PointerConfig;
use cagebox_math::Vec3;
use cagebox_physics::{BroadphaseKind, ContactMaterial};
use cagebox_render::{Camera, FocusState, NavigatorConfig};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::systems::DragConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    /// Pointer, orbit and drag tuning
    pub input: InputConfig,
    pub physics: PhysicsConfig,
    /// Cage used when no scene file provides one
    pub cage: CageConfig,
    pub navigation: NavigationConfig,
    pub scene: SceneConfig,
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. Built-in defaults
    /// 2. `config/default.toml`
    /// 3. `config/user.toml`
    /// 4. Environment variables (`CAGEBOX_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        } else {
            log::warn!("No config at {}; using built-in defaults", default_path.display());
        }

        // User overrides are optional
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // CAGEBOX_WINDOW__TITLE=Test -> window.title = "Test"
        figment = figment.merge(Env::prefixed("CAGEBOX_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Start in fullscreen mode
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Cagebox".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position [x, y, z]
    pub start_position: [f32; 3],
    /// Point the camera looks at before anything is selected
    pub look_at: [f32; 3],
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 0.0, 8.0],
            look_at: [0.0, 0.0, 0.0],
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self) -> Camera {
        Camera::new(Vec3::from(self.start_position))
            .with_fov_degrees(self.fov)
            .with_clip(self.near, self.far)
    }

    pub fn look_at(&self) -> Vec3 {
        Vec3::from(self.look_at)
    }
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Pointer travel in pixels that turns a press into an orbit
    pub tap_threshold_px: f32,
    /// Hold time before a press on an object starts a drag
    pub long_press_ms: u64,
    /// Radians of orbit per pixel of pointer travel
    pub orbit_rotate_speed: f32,
    /// Orbit smoothing half-life in seconds (lower = more responsive)
    pub smoothing_half_life: f32,
    pub smoothing_enabled: bool,
    /// World units of lift per NDC unit of vertical pointer travel
    pub drag_vertical_factor: f32,
    /// Camera elevation in radians below which drags may lift objects
    pub drag_elevation_threshold: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            tap_threshold_px: 10.0,
            long_press_ms: 1000,
            orbit_rotate_speed: 0.005,
            smoothing_half_life: 0.05,
            smoothing_enabled: false,
            drag_vertical_factor: 10.0,
            drag_elevation_threshold: 0.35,
        }
    }
}

impl InputConfig {
    pub fn to_pointer_config(&self) -> PointerConfig {
        PointerConfig {
            tap_threshold_px: self.tap_threshold_px,
            long_press: Duration::from_millis(self.long_press_ms),
        }
    }

    pub fn to_drag_config(&self) -> DragConfig {
        DragConfig {
            vertical_factor: self.drag_vertical_factor,
            elevation_threshold: self.drag_elevation_threshold,
            ..DragConfig::default()
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity (negative = downward)
    pub gravity: f32,
    /// Length of one substep in seconds
    pub fixed_timestep: f32,
    /// Catch-up substeps per frame
    pub max_substeps: u32,
    pub solver_iterations: u32,
    pub broadphase: BroadphaseKind,
    pub friction: f32,
    pub restitution: f32,
    pub contact_stiffness: f32,
    pub contact_relaxation: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::from(cagebox_physics::PhysicsConfig::default())
    }
}

impl From<cagebox_physics::PhysicsConfig> for PhysicsConfig {
    fn from(config: cagebox_physics::PhysicsConfig) -> Self {
        Self {
            gravity: config.gravity,
            fixed_timestep: config.fixed_timestep,
            max_substeps: config.max_substeps,
            solver_iterations: config.solver_iterations,
            broadphase: config.broadphase,
            friction: config.contact_material.friction,
            restitution: config.contact_material.restitution,
            contact_stiffness: config.contact_material.contact_stiffness,
            contact_relaxation: config.contact_material.contact_relaxation,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
        }
    }
}

impl PhysicsConfig {
    /// Convert to the physics engine's config type
    pub fn to_physics_config(&self) -> cagebox_physics::PhysicsConfig {
        cagebox_physics::PhysicsConfig {
            gravity: self.gravity,
            fixed_timestep: self.fixed_timestep,
            max_substeps: self.max_substeps,
            solver_iterations: self.solver_iterations,
            broadphase: self.broadphase,
            linear_damping: self.linear_damping,
            angular_damping: self.angular_damping,
            contact_material: ContactMaterial {
                friction: self.friction,
                restitution: self.restitution,
                contact_stiffness: self.contact_stiffness,
                contact_relaxation: self.contact_relaxation,
            },
        }
    }
}

/// Cage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CageConfig {
    /// Bottom centre of the cage [x, y, z]
    pub origin: [f32; 3],
    /// Outer width and depth
    pub size: f32,
    /// Floor slab thickness
    pub base_height: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
}

impl Default for CageConfig {
    fn default() -> Self {
        let d = CageDimensions::default();
        Self {
            origin: d.origin.to_array(),
            size: d.size,
            base_height: d.base_height,
            wall_height: d.wall_height,
            wall_thickness: d.wall_thickness,
        }
    }
}

impl CageConfig {
    pub fn to_dimensions(&self) -> CageDimensions {
        CageDimensions {
            origin: Vec3::from(self.origin),
            size: self.size,
            base_height: self.base_height,
            wall_height: self.wall_height,
            wall_thickness: self.wall_thickness,
        }
    }
}

/// Camera navigation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Duration of an eased transition between targets
    pub transition_ms: u64,
    /// Exponential follow rate per second
    pub follow_rate: f32,
    /// Whether the camera keeps easing toward its target between transitions
    pub follow_enabled: bool,
    /// Keep the focus on the selected body while it moves
    pub track_selection: bool,
    /// Offset from the target used until one is measured
    pub follow_distance: f32,
    pub follow_yaw: f32,
    pub follow_pitch: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        let focus = FocusState::default();
        Self {
            transition_ms: 2000,
            follow_rate: 5.0,
            follow_enabled: true,
            track_selection: false,
            follow_distance: focus.distance,
            follow_yaw: focus.yaw,
            follow_pitch: focus.pitch,
        }
    }
}

impl NavigationConfig {
    pub fn to_navigator_config(&self) -> NavigatorConfig {
        NavigatorConfig {
            transition: Duration::from_millis(self.transition_ms),
            follow_rate: self.follow_rate,
            follow_enabled: self.follow_enabled,
            default_focus: FocusState {
                distance: self.follow_distance,
                yaw: self.follow_yaw,
                pitch: self.follow_pitch,
            },
        }
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// RON scene loaded at startup
    pub path: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: "scenes/default.ron".to_string(),
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace); `RUST_LOG` still wins
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.physics.gravity, -9.82);
        assert_eq!(config.input.long_press_ms, 1000);
        assert_eq!(config.navigation.transition_ms, 2000);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("title"));
        assert!(toml.contains("gravity"));
        assert!(toml.contains("broadphase = \"naive\""));
    }

    #[test]
    fn test_physics_round_trips_engine_defaults() {
        let engine = cagebox_physics::PhysicsConfig::default();
        let converted = PhysicsConfig::default().to_physics_config();
        assert_eq!(converted, engine);
        assert_eq!(converted.contact_material.friction, 0.98);
        assert_eq!(converted.max_substeps, 10);
    }

    #[test]
    fn test_cage_defaults_match_core() {
        let dims = CageConfig::default().to_dimensions();
        assert_eq!(dims, CageDimensions::default());
        assert!((dims.floor_top() + 1.7).abs() < 1e-6);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("[input]\nlong_press_ms = 500\n"))
            .extract()
            .unwrap();
        assert_eq!(config.input.long_press_ms, 500);
        assert_eq!(config.input.tap_threshold_px, 10.0);
        assert_eq!(config.window.title, "Cagebox");
    }

    #[test]
    fn test_pointer_and_navigator_conversion() {
        let config = AppConfig::default();
        let pointer = config.input.to_pointer_config();
        assert_eq!(pointer.long_press, Duration::from_millis(1000));
        let nav = config.navigation.to_navigator_config();
        assert_eq!(nav.transition, Duration::from_secs(2));
        assert_eq!(nav.default_focus, FocusState::default());
    }
}
