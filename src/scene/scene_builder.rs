//! Scene builder for constructing a sandbox
//!
//! Provides a fluent API for assembling the cage and the initial instances
//! before the simulation starts.
//!
//! # Example
//! ```ignore
//! let sandbox = SandboxBuilder::new()
//!     .with_physics(PhysicsConfig::default())
//!     .with_cage(CageDimensions::default())
//!     .add_shape(ShapeKind::Box, Vec3::new(0.0, 5.0, 0.0), 1.0, "crate")
//!     .build()?;
//! ```

use std::path::Path;

use cagebox_core::{
    CageDimensions, InstanceId, Object3DInstance, PhysicsConfig, Scene, SceneLoadError, ShapeKind, Vec3, WorldError,
};

use super::Sandbox;

/// Builder for creating sandboxes with a fluent API
pub struct SandboxBuilder {
    physics: PhysicsConfig,
    scene: Scene,
}

impl SandboxBuilder {
    /// Empty builder with default physics and cage
    pub fn new() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            scene: Scene::new("sandbox"),
        }
    }

    /// Start from an existing scene (its cage and instances)
    pub fn from_scene(scene: Scene) -> Self {
        Self {
            physics: PhysicsConfig::default(),
            scene,
        }
    }

    /// Start from a RON scene file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneLoadError> {
        let scene = Scene::load(path.as_ref())?;
        log::info!("Loaded scene '{}' from {}", scene.name, path.as_ref().display());
        Ok(Self::from_scene(scene))
    }

    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_cage(mut self, cage: CageDimensions) -> Self {
        self.scene.cage = cage;
        self
    }

    /// Add a fully described instance
    pub fn add_instance(mut self, instance: Object3DInstance) -> Self {
        self.scene.add_instance(instance);
        self
    }

    /// Add a shape with default color, rotation and scale
    pub fn add_shape(self, kind: ShapeKind, position: Vec3, size: f32, id: &str) -> Self {
        self.add_instance(Object3DInstance::new(InstanceId::new(id), kind, position, size))
    }

    /// Select an instance already added to the builder
    pub fn with_selection(mut self, id: &str) -> Self {
        self.scene.select(Some(InstanceId::new(id)));
        self
    }

    /// The scene as it will be instantiated
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Initialize physics, mount the cage and spawn every instance
    pub fn build(self) -> Result<Sandbox, WorldError> {
        Sandbox::new(self.physics, self.scene)
    }
}

impl Default for SandboxBuilder {
    fn default() -> Self {
        Self::new()
    }
}
