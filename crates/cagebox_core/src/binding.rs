//! Body bindings
//!
//! A [`BodyBinding`] owns the lifecycle of one rigid body on behalf of one
//! renderable node. The body is created once by a constructor and survives
//! unmount/remount cycles; mounting inserts it into the world and registers
//! the pair, unmounting does the reverse.

use cagebox_math::{Quat, Vec3};
use cagebox_physics::{BodyKey, BodyType, RigidBody, Shape};

use crate::instance::Object3DInstance;
use crate::scene_graph::{NodeKey, SceneGraph, SceneNode};
use crate::transform::Transform;
use crate::world::{RigidBodyWorld, WorldError};

/// Mass used when none is given
pub const DEFAULT_MASS: f32 = 1.0;

/// Initial state for a new body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyOptions {
    pub position: Vec3,
    /// XYZ Euler angles in radians
    pub rotation: Vec3,
    pub mass: Option<f32>,
    /// Overrides the type implied by the mass
    pub body_type: Option<BodyType>,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            mass: None,
            body_type: None,
        }
    }
}

impl BodyOptions {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn with_rotation(mut self, euler: Vec3) -> Self {
        self.rotation = euler;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = Some(body_type);
        self
    }

    /// Mass after applying the type override
    ///
    /// A static override forces zero. A dynamic override with a non-positive
    /// mass falls back to [`DEFAULT_MASS`].
    pub fn resolved_mass(&self) -> f32 {
        let mass = self.mass.unwrap_or(DEFAULT_MASS);
        match self.body_type {
            Some(BodyType::Static) => 0.0,
            Some(BodyType::Dynamic) if mass <= 0.0 => DEFAULT_MASS,
            _ => mass,
        }
    }
}

/// One body paired with one scene node
#[derive(Debug)]
pub struct BodyBinding {
    /// Held while unmounted
    body: Option<RigidBody>,
    key: Option<BodyKey>,
    node: Option<NodeKey>,
    is_static: bool,
}

impl BodyBinding {
    /// Binding for an arbitrary collider shape
    pub fn from_shape(shape: Shape, options: BodyOptions) -> Self {
        let body = RigidBody::new(shape, options.resolved_mass())
            .with_position(options.position)
            .with_orientation(Quat::from_euler_xyz(options.rotation.x, options.rotation.y, options.rotation.z));
        Self::from_body(body)
    }

    /// Binding around an already-built body
    pub fn from_body(body: RigidBody) -> Self {
        let is_static = body.is_static();
        Self {
            body: Some(body),
            key: None,
            node: None,
            is_static,
        }
    }

    /// Box with the given half extents
    pub fn cuboid(half_extents: Vec3, options: BodyOptions) -> Self {
        Self::from_shape(Shape::cuboid(half_extents), options)
    }

    pub fn sphere(radius: f32, options: BodyOptions) -> Self {
        Self::from_shape(Shape::sphere(radius), options)
    }

    /// Cylinder; a zero `radius_top` makes a cone
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32, options: BodyOptions) -> Self {
        Self::from_shape(Shape::cylinder(radius_top, radius_bottom, height, segments), options)
    }

    /// Binding for a spawned instance, using its shape factory mass
    pub fn from_instance(instance: &Object3DInstance) -> Self {
        let descriptor = instance.descriptor();
        let options = BodyOptions::at(instance.position)
            .with_rotation(instance.rotation)
            .with_mass(descriptor.mass);
        Self::from_shape(descriptor.collider, options)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.key.is_some()
    }

    pub fn key(&self) -> Option<BodyKey> {
        self.key
    }

    pub fn node(&self) -> Option<NodeKey> {
        self.node
    }

    /// Insert the body into the world and pair it with `node`
    ///
    /// The node is placed at the body's pose once here. Mounting twice logs
    /// a warning and returns the existing key.
    pub fn mount(&mut self, world: &mut RigidBodyWorld, graph: &mut SceneGraph, node: NodeKey) -> Result<BodyKey, WorldError> {
        if let Some(key) = self.key {
            log::warn!("Binding for {:?} is already mounted", key);
            return Ok(key);
        }
        if !world.is_initialized() {
            return Err(WorldError::NotInitialized);
        }
        let body = self.body.take().ok_or(WorldError::UnknownBody)?;
        graph.set_world_pose(node, body.position, body.orientation);
        let key = world.add_body(body)?;
        world.register(key, node, self.is_static);
        log::debug!("Mounted body {:?} on node {:?} (static: {})", key, node, self.is_static);
        self.key = Some(key);
        self.node = Some(node);
        Ok(key)
    }

    /// Unregister and remove the body, keeping it for a later remount
    pub fn unmount(&mut self, world: &mut RigidBodyWorld) -> Result<(), WorldError> {
        let Some(key) = self.key.take() else {
            log::warn!("Unmounting a binding that is not mounted");
            return Ok(());
        };
        self.node = None;
        world.unregister(key);
        let body = world.remove_body(key).ok_or(WorldError::UnknownBody)?;
        self.body = Some(body);
        log::debug!("Unmounted body {:?}", key);
        Ok(())
    }

    /// Apply an impulse, optionally at a world point. Static bodies ignore it.
    pub fn apply_impulse(&mut self, world: &mut RigidBodyWorld, impulse: Vec3, world_point: Option<Vec3>) -> Result<(), WorldError> {
        if self.is_static {
            return Ok(());
        }
        let body = match self.key {
            Some(key) => world.body_mut(key).ok_or(WorldError::UnknownBody)?,
            None => self.body.as_mut().ok_or(WorldError::UnknownBody)?,
        };
        body.apply_impulse(impulse, world_point);
        Ok(())
    }

    /// Current body, from the world when mounted
    pub fn body<'a>(&'a self, world: &'a RigidBodyWorld) -> Option<&'a RigidBody> {
        match self.key {
            Some(key) => world.body(key),
            None => self.body.as_ref(),
        }
    }
}

impl Object3DInstance {
    /// Render node for this instance: geometry, material, id and scale
    pub fn scene_node(&self) -> SceneNode {
        let descriptor = self.descriptor();
        SceneNode::new(self.id.as_str())
            .with_transform(Transform::from_position_rotation(self.position, self.orientation()).with_scale(self.scale))
            .with_geometry(descriptor.geometry)
            .with_material(self.material())
            .with_instance(self.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ShapeKind;

    fn world() -> RigidBodyWorld {
        let mut world = RigidBodyWorld::default();
        world.initialize();
        world
    }

    #[test]
    fn test_mass_resolution() {
        assert_eq!(BodyOptions::default().resolved_mass(), DEFAULT_MASS);
        assert_eq!(BodyOptions::default().with_mass(0.0).resolved_mass(), 0.0);
        assert_eq!(BodyOptions::default().with_mass(5.0).with_body_type(BodyType::Static).resolved_mass(), 0.0);
        assert_eq!(BodyOptions::default().with_mass(0.0).with_body_type(BodyType::Dynamic).resolved_mass(), DEFAULT_MASS);
    }

    #[test]
    fn test_mount_sets_node_pose_and_registers() {
        let mut world = world();
        let mut graph = SceneGraph::new();
        let node = graph.add(SceneNode::new("box"));
        let mut binding = BodyBinding::cuboid(Vec3::splat(0.5), BodyOptions::at(Vec3::new(1.0, 2.0, 3.0)));
        let key = binding.mount(&mut world, &mut graph, node).unwrap();
        assert!(world.is_registered(key));
        assert_eq!(graph.get(node).unwrap().local.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_mount_twice_keeps_one_body() {
        let mut world = world();
        let mut graph = SceneGraph::new();
        let node = graph.add(SceneNode::new("ball"));
        let mut binding = BodyBinding::sphere(0.5, BodyOptions::default());
        let first = binding.mount(&mut world, &mut graph, node).unwrap();
        let second = binding.mount(&mut world, &mut graph, node).unwrap();
        assert_eq!(first, second);
        assert_eq!(world.physics().unwrap().body_count(), 1);
    }

    #[test]
    fn test_unmount_is_symmetric() {
        let mut world = world();
        let mut graph = SceneGraph::new();
        let node = graph.add(SceneNode::new("ball"));
        let mut binding = BodyBinding::sphere(0.5, BodyOptions::default());
        binding.mount(&mut world, &mut graph, node).unwrap();
        binding.unmount(&mut world).unwrap();
        assert_eq!(world.physics().unwrap().body_count(), 0);
        assert!(world.pairs().is_empty());
        assert!(!binding.is_mounted());

        // Remount reuses the same body
        binding.mount(&mut world, &mut graph, node).unwrap();
        assert_eq!(world.physics().unwrap().body_count(), 1);
    }

    #[test]
    fn test_mount_requires_initialized_world() {
        let mut world = RigidBodyWorld::default();
        let mut graph = SceneGraph::new();
        let node = graph.add(SceneNode::new("ball"));
        let mut binding = BodyBinding::sphere(0.5, BodyOptions::default());
        assert_eq!(binding.mount(&mut world, &mut graph, node), Err(WorldError::NotInitialized));
        assert!(!binding.is_mounted());
    }

    #[test]
    fn test_apply_impulse_static_is_noop() {
        let mut world = world();
        let mut graph = SceneGraph::new();
        let node = graph.add(SceneNode::new("slab"));
        let mut binding = BodyBinding::cuboid(Vec3::splat(1.0), BodyOptions::default().with_mass(0.0));
        let key = binding.mount(&mut world, &mut graph, node).unwrap();
        binding.apply_impulse(&mut world, Vec3::new(0.0, 10.0, 0.0), None).unwrap();
        assert_eq!(world.body(key).unwrap().linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_apply_impulse_dynamic() {
        let mut world = world();
        let mut graph = SceneGraph::new();
        let node = graph.add(SceneNode::new("box"));
        let mut binding = BodyBinding::cuboid(Vec3::splat(0.5), BodyOptions::default().with_mass(2.0));
        let key = binding.mount(&mut world, &mut graph, node).unwrap();
        binding.apply_impulse(&mut world, Vec3::new(4.0, 0.0, 0.0), None).unwrap();
        assert!((world.body(key).unwrap().linear_velocity.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_cone_instance_binding() {
        let instance = Object3DInstance::new("c", ShapeKind::Cone, Vec3::new(0.0, 3.0, 0.0), 1.0);
        let binding = BodyBinding::from_instance(&instance);
        let world = world();
        let body = binding.body(&world).unwrap();
        assert_eq!(body.mass(), 6.0);
        assert!(!binding.is_static());
    }

    #[test]
    fn test_instance_scene_node() {
        let instance = Object3DInstance::new("t", ShapeKind::Torus, Vec3::new(1.0, 2.0, 0.0), 1.0).with_scale(2.0);
        let node = instance.scene_node();
        assert_eq!(node.instance_id, Some(instance.id.clone()));
        assert_eq!(node.local.scale, 2.0);
        assert!(node.geometry.is_some());
    }
}
