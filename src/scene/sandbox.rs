//! The running sandbox: simulation, transform arena, cage and instances
//!
//! Every spawned instance gets one scene node and one body binding keyed by
//! its id. Spawning and despawning keep the three in step so bodies never
//! outlive their nodes.

use std::collections::HashMap;

use cagebox_core::{
    BodyBinding, CageCompoundBody, InstanceId, NodeKey, Object3DInstance, PhysicsConfig, RigidBodyWorld, Scene,
    SceneGraph, Vec3, WorldError,
};

/// Owns everything the frame loop simulates and renders
pub struct Sandbox {
    pub world: RigidBodyWorld,
    pub graph: SceneGraph,
    /// Instance records and the current selection
    pub scene: Scene,
    cage: CageCompoundBody,
    cage_angle: f32,
    bindings: HashMap<InstanceId, BodyBinding>,
}

impl Sandbox {
    /// Initialize the world, mount the scene's cage and spawn its instances
    pub fn new(physics: PhysicsConfig, scene: Scene) -> Result<Self, WorldError> {
        let mut world = RigidBodyWorld::new(physics);
        world.initialize();
        let mut graph = SceneGraph::new();
        let mut cage = CageCompoundBody::new(scene.cage);
        cage.mount(&mut world, &mut graph)?;

        let instances = scene.instances.clone();
        let selected = scene.selected.clone();
        let mut sandbox = Self {
            world,
            graph,
            scene: Scene::new(scene.name).with_cage(scene.cage),
            cage,
            cage_angle: 0.0,
            bindings: HashMap::new(),
        };
        for instance in instances {
            sandbox.spawn(instance)?;
        }
        sandbox.scene.select(selected);
        log::info!("Sandbox ready with {} instances", sandbox.instance_count());
        Ok(sandbox)
    }

    pub fn cage(&self) -> &CageCompoundBody {
        &self.cage
    }

    /// Top surface of the cage floor in world space
    pub fn floor_top(&self) -> f32 {
        self.cage.dimensions().floor_top()
    }

    /// Add an instance and its body. An existing instance with the same id
    /// is replaced.
    pub fn spawn(&mut self, instance: Object3DInstance) -> Result<NodeKey, WorldError> {
        if self.bindings.contains_key(&instance.id) {
            self.despawn(&instance.id);
        }
        let node = self.graph.add(instance.scene_node());
        let mut binding = BodyBinding::from_instance(&instance);
        if let Err(e) = binding.mount(&mut self.world, &mut self.graph, node) {
            self.graph.remove(node);
            return Err(e);
        }
        log::debug!("Spawned {} ({:?}) at {:?}", instance.id, instance.shape_type, instance.position);
        self.bindings.insert(instance.id.clone(), binding);
        self.scene.add_instance(instance);
        Ok(node)
    }

    /// Remove an instance, its body and its node
    pub fn despawn(&mut self, id: &InstanceId) -> bool {
        let Some(mut binding) = self.bindings.remove(id) else {
            return false;
        };
        let node = binding.node();
        if let Err(e) = binding.unmount(&mut self.world) {
            log::warn!("Unmounting {} failed: {}", id, e);
        }
        if let Some(node) = node {
            self.graph.remove(node);
        }
        self.scene.remove_instance(id);
        true
    }

    /// Despawn every instance; the cage stays
    pub fn clear(&mut self) {
        let ids: Vec<InstanceId> = self.bindings.keys().cloned().collect();
        for id in &ids {
            self.despawn(id);
        }
        self.scene.clear();
        log::info!("Cleared {} instances", ids.len());
    }

    pub fn instance_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn binding(&self, id: &InstanceId) -> Option<&BodyBinding> {
        self.bindings.get(id)
    }

    pub fn binding_mut(&mut self, id: &InstanceId) -> Option<&mut BodyBinding> {
        self.bindings.get_mut(id)
    }

    pub fn node_for(&self, id: &InstanceId) -> Option<NodeKey> {
        self.bindings.get(id).and_then(|b| b.node())
    }

    /// Current simulated position of an instance
    pub fn body_position(&self, id: &InstanceId) -> Option<Vec3> {
        self.bindings.get(id)?.body(&self.world).map(|b| b.position)
    }

    /// Advance physics by one frame and sync nodes; returns substeps taken
    pub fn step(&mut self, frame_dt: f32) -> u32 {
        self.world.step(frame_dt, &mut self.graph)
    }

    pub fn cage_angle(&self) -> f32 {
        self.cage_angle
    }

    /// Turn the rendered cage by `delta` radians about Y
    pub fn rotate_cage(&mut self, delta: f32) {
        self.cage_angle = (self.cage_angle + delta).rem_euclid(std::f32::consts::TAU);
        self.cage.set_visual_rotation(&mut self.graph, self.cage_angle);
    }
}
