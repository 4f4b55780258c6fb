//! Rigid-body world
//!
//! Owns the physics simulation and the list of body/node pairs whose poses
//! are copied into the [`SceneGraph`] after every step.

use std::fmt;

use cagebox_physics::{BodyKey, PhysicsConfig, PhysicsWorld, RigidBody};

use crate::scene_graph::{NodeKey, SceneGraph};

/// A registered link between a physics body and a scene node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyPair {
    pub body: BodyKey,
    pub node: NodeKey,
    /// Static pairs are never written back to the scene graph
    pub is_static: bool,
}

/// Errors from world operations that need a live simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// `initialize` has not been called yet
    NotInitialized,
    /// The body key does not name a body in the simulation
    UnknownBody,
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::NotInitialized => write!(f, "physics world has not been initialized"),
            WorldError::UnknownBody => write!(f, "body is not part of the physics world"),
        }
    }
}

impl std::error::Error for WorldError {}

/// The simulation plus its body/node registry
pub struct RigidBodyWorld {
    physics: Option<PhysicsWorld>,
    config: PhysicsConfig,
    pairs: Vec<BodyPair>,
}

impl Default for RigidBodyWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl RigidBodyWorld {
    /// Create an uninitialized world; call [`initialize`](Self::initialize)
    /// before adding bodies
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            physics: None,
            config,
            pairs: Vec::new(),
        }
    }

    /// Create the simulation. Repeated calls keep the existing one.
    pub fn initialize(&mut self) {
        if self.physics.is_some() {
            log::debug!("Physics world already initialized");
            return;
        }
        log::info!(
            "Initializing physics world: gravity {}, fixed step {:.4}s, broadphase {:?}",
            self.config.gravity,
            self.config.fixed_timestep,
            self.config.broadphase
        );
        self.physics = Some(PhysicsWorld::with_config(self.config.clone()));
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.physics.is_some()
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn physics(&self) -> Option<&PhysicsWorld> {
        self.physics.as_ref()
    }

    pub fn physics_mut(&mut self) -> Option<&mut PhysicsWorld> {
        self.physics.as_mut()
    }

    /// Insert a body into the simulation
    pub fn add_body(&mut self, body: RigidBody) -> Result<BodyKey, WorldError> {
        let physics = self.physics.as_mut().ok_or(WorldError::NotInitialized)?;
        Ok(physics.add_body(body))
    }

    /// Remove a body from the simulation, dropping any pair that names it
    pub fn remove_body(&mut self, body: BodyKey) -> Option<RigidBody> {
        self.pairs.retain(|p| p.body != body);
        self.physics.as_mut()?.remove_body(body)
    }

    pub fn body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.physics.as_ref()?.get_body(key)
    }

    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.physics.as_mut()?.get_body_mut(key)
    }

    /// Record a body/node pair for pose sync
    ///
    /// Returns false (and logs a warning) if the body is already registered.
    pub fn register(&mut self, body: BodyKey, node: NodeKey, is_static: bool) -> bool {
        if self.pairs.iter().any(|p| p.body == body) {
            log::warn!("Body {:?} is already registered; ignoring", body);
            return false;
        }
        self.pairs.push(BodyPair { body, node, is_static });
        true
    }

    /// Forget a pair. Returns false (and logs a warning) if it was unknown.
    pub fn unregister(&mut self, body: BodyKey) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| p.body != body);
        if self.pairs.len() == before {
            log::warn!("Body {:?} is not registered; nothing to remove", body);
            return false;
        }
        true
    }

    pub fn is_registered(&self, body: BodyKey) -> bool {
        self.pairs.iter().any(|p| p.body == body)
    }

    pub fn pairs(&self) -> &[BodyPair] {
        &self.pairs
    }

    /// Node paired with a body, if any
    pub fn node_for(&self, body: BodyKey) -> Option<NodeKey> {
        self.pairs.iter().find(|p| p.body == body).map(|p| p.node)
    }

    /// Body paired with a node, if any
    pub fn body_for(&self, node: NodeKey) -> Option<BodyKey> {
        self.pairs.iter().find(|p| p.node == node).map(|p| p.body)
    }

    /// Advance the simulation by one frame and copy dynamic poses into the
    /// scene graph
    ///
    /// Returns the number of fixed substeps taken. Does nothing before
    /// initialization.
    pub fn step(&mut self, frame_dt: f32, graph: &mut SceneGraph) -> u32 {
        let Some(physics) = self.physics.as_mut() else {
            return 0;
        };
        let steps = physics.step_fixed(frame_dt);
        self.sync(graph);
        steps
    }

    /// Copy every non-static body's pose onto its node
    ///
    /// Pairs whose node or body has gone away are skipped.
    pub fn sync(&self, graph: &mut SceneGraph) {
        let Some(physics) = self.physics.as_ref() else {
            return;
        };
        for pair in self.pairs.iter().filter(|p| !p.is_static) {
            let Some(body) = physics.get_body(pair.body) else {
                continue;
            };
            if !graph.contains(pair.node) {
                continue;
            }
            graph.set_world_pose(pair.node, body.position, body.orientation);
        }
    }

    /// Zero the velocities of a body, e.g. while it is being dragged
    pub fn freeze(&mut self, body: BodyKey) -> Result<(), WorldError> {
        let physics = self.physics.as_mut().ok_or(WorldError::NotInitialized)?;
        let body = physics.get_body_mut(body).ok_or(WorldError::UnknownBody)?;
        body.clear_velocity();
        Ok(())
    }
}
