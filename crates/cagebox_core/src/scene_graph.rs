//! Transform arena
//!
//! Every renderable transform lives in a [`SceneGraph`] slot addressed by a
//! [`NodeKey`]. Physics bindings and the renderer hold the same key rather
//! than a reference; a key whose node was removed simply resolves to `None`.

use bitflags::bitflags;
use cagebox_math::{Quat, Ray, Vec3};
use cagebox_physics::Aabb;
use slotmap::{new_key_type, SlotMap};

use crate::geometry::GeometryDesc;
use crate::instance::{InstanceId, Material};
use crate::transform::Transform;

new_key_type! {
    /// Key to a node in the scene graph
    pub struct NodeKey;
}

bitflags! {
    /// Flags indicating which parts of a node changed since the renderer
    /// last looked
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        const NONE = 0;
        /// Local transform has changed
        const TRANSFORM = 1 << 0;
        /// Geometry has changed
        const MESH = 1 << 1;
        /// Material has changed
        const MATERIAL = 1 << 2;
        const ALL = Self::TRANSFORM.bits() | Self::MESH.bits() | Self::MATERIAL.bits();
    }
}

/// One transform record, optionally renderable and pickable
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent (or the world for roots)
    pub local: Transform,
    /// Present on nodes that represent a spawned instance
    pub instance_id: Option<InstanceId>,
    pub geometry: Option<GeometryDesc>,
    pub material: Material,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    dirty: DirtyFlags,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Transform::identity(),
            instance_id: None,
            geometry: None,
            material: Material::default(),
            parent: None,
            children: Vec::new(),
            dirty: DirtyFlags::ALL,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.local = transform;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryDesc) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_instance(mut self, id: InstanceId) -> Self {
        self.instance_id = Some(id);
        self
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }
}

/// A ray-intersection result
#[derive(Clone, Debug, PartialEq)]
pub struct RayHit {
    pub node: NodeKey,
    pub instance_id: Option<InstanceId>,
    /// Distance from the ray origin in world units
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Arena of scene nodes with parent links
#[derive(Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node
    pub fn add(&mut self, node: SceneNode) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Add a node under `parent`; `None` if the parent no longer exists
    pub fn add_child(&mut self, parent: NodeKey, mut node: SceneNode) -> Option<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        Some(key)
    }

    /// Remove a node and its whole subtree, returning the node itself
    pub fn remove(&mut self, key: NodeKey) -> Option<SceneNode> {
        let node = self.nodes.remove(key)?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != key);
        }
        let mut stack = node.children.clone();
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(child) {
                stack.extend(removed.children);
            }
        }
        Some(node)
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &SceneNode)> {
        self.nodes.iter()
    }

    /// Node carrying the given instance id
    pub fn find_instance(&self, id: &InstanceId) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find(|(_, n)| n.instance_id.as_ref() == Some(id))
            .map(|(k, _)| k)
    }

    /// Accumulated transform from the root down to this node
    pub fn world_transform(&self, key: NodeKey) -> Option<Transform> {
        let node = self.nodes.get(key)?;
        let mut world = node.local;
        let mut parent = node.parent;
        while let Some(p) = parent {
            let Some(parent_node) = self.nodes.get(p) else {
                break;
            };
            world = parent_node.local.compose(&world);
            parent = parent_node.parent;
        }
        Some(world)
    }

    /// Replace a node's local position and rotation
    pub fn set_local_pose(&mut self, key: NodeKey, position: Vec3, rotation: Quat) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.local.position = position;
                node.local.rotation = rotation;
                node.dirty |= DirtyFlags::TRANSFORM;
                true
            }
            None => false,
        }
    }

    /// Place a node at a world-space pose, converting into its parent's
    /// local space when it has one. Scale is left untouched.
    pub fn set_world_pose(&mut self, key: NodeKey, position: Vec3, rotation: Quat) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        let (local_position, local_rotation) = match node.parent.and_then(|p| self.world_transform(p)) {
            Some(parent_world) => (
                parent_world.inverse().transform_point(position),
                (parent_world.rotation.inverse() * rotation).normalized(),
            ),
            None => (position, rotation),
        };
        self.set_local_pose(key, local_position, local_rotation)
    }

    /// World-space bounds of a node's geometry
    pub fn world_bounds(&self, key: NodeKey) -> Option<Aabb> {
        let geometry = self.nodes.get(key)?.geometry?;
        let world = self.world_transform(key)?;
        let local = geometry.local_bounds();
        let mut corners = Vec::with_capacity(8);
        for &x in &[local.min.x, local.max.x] {
            for &y in &[local.min.y, local.max.y] {
                for &z in &[local.min.z, local.max.z] {
                    corners.push(world.transform_point(Vec3::new(x, y, z)));
                }
            }
        }
        Some(Aabb::from_points(&corners))
    }

    /// Intersect a world-space ray with every node that has geometry
    ///
    /// Hits are ordered nearest first.
    pub fn intersect_ray(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .nodes
            .iter()
            .filter_map(|(key, node)| {
                let geometry = node.geometry.as_ref()?;
                let inverse = self.world_transform(key)?.inverse();
                let origin = inverse.transform_point(ray.origin);
                // Unnormalized on purpose: keeps t in world units
                let direction = inverse.transform_direction(ray.direction);
                let t = geometry.intersect_ray(origin, direction)?;
                Some(RayHit {
                    node: key,
                    instance_id: node.instance_id.clone(),
                    distance: t,
                    point: ray.at(t),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Nearest hit whose node carries an instance id
    pub fn pick_instance(&self, ray: &Ray) -> Option<RayHit> {
        self.intersect_ray(ray)
            .into_iter()
            .find(|hit| hit.instance_id.is_some())
    }

    /// Keys of nodes with pending changes; clears their flags
    pub fn take_dirty(&mut self) -> Vec<NodeKey> {
        self.nodes
            .iter_mut()
            .filter(|(_, n)| !n.dirty.is_empty())
            .map(|(k, n)| {
                n.dirty = DirtyFlags::NONE;
                k
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn unit_box(name: &str, position: Vec3) -> SceneNode {
        SceneNode::new(name)
            .with_transform(Transform::from_position(position))
            .with_geometry(GeometryDesc::Cuboid { half_extents: Vec3::splat(0.5) })
    }

    #[test]
    fn test_world_transform_through_parent() {
        let mut graph = SceneGraph::new();
        let group = graph.add(SceneNode::new("group").with_transform(Transform::from_position(Vec3::new(0.0, -2.0, 0.0))));
        let child = graph.add_child(group, unit_box("child", Vec3::new(1.0, 0.5, 0.0))).unwrap();
        let world = graph.world_transform(child).unwrap();
        assert!(vec_approx_eq(world.position, Vec3::new(1.0, -1.5, 0.0)));
    }

    #[test]
    fn test_set_world_pose_converts_to_parent_space() {
        let mut graph = SceneGraph::new();
        let parent_rot = Quat::from_axis_angle(Vec3::Y, 0.7);
        let group = graph.add(
            SceneNode::new("group")
                .with_transform(Transform::from_position_rotation(Vec3::new(3.0, -2.0, 1.0), parent_rot)),
        );
        let child = graph.add_child(group, SceneNode::new("child")).unwrap();

        let target_pos = Vec3::new(-1.0, 4.0, 2.0);
        let target_rot = Quat::from_euler_xyz(0.2, -0.4, 0.1);
        assert!(graph.set_world_pose(child, target_pos, target_rot));

        let world = graph.world_transform(child).unwrap();
        assert!(vec_approx_eq(world.position, target_pos));
        assert!(world.rotation.angle_to(target_rot) < 1e-3);
    }

    #[test]
    fn test_remove_subtree_and_stale_keys() {
        let mut graph = SceneGraph::new();
        let group = graph.add(SceneNode::new("group"));
        let child = graph.add_child(group, SceneNode::new("child")).unwrap();
        graph.remove(group);
        assert!(!graph.contains(child));
        assert!(graph.world_transform(child).is_none());
        assert!(!graph.set_world_pose(child, Vec3::ZERO, Quat::IDENTITY));
        assert!(graph.add_child(group, SceneNode::new("orphan")).is_none());
    }

    #[test]
    fn test_intersect_ray_orders_hits() {
        let mut graph = SceneGraph::new();
        let far = graph.add(unit_box("far", Vec3::new(0.0, 0.0, -5.0)));
        let near = graph.add(unit_box("near", Vec3::new(0.0, 0.0, 0.0)));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hits = graph.intersect_ray(&ray);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].node, near);
        assert_eq!(hits[1].node, far);
        assert!((hits[0].distance - 4.5).abs() < 1e-4);
        assert!(vec_approx_eq(hits[0].point, Vec3::new(0.0, 0.0, 0.5)));
    }

    #[test]
    fn test_pick_instance_skips_unannotated_nodes() {
        let mut graph = SceneGraph::new();
        graph.add(unit_box("wall", Vec3::new(0.0, 0.0, 0.0)));
        let target = graph.add(unit_box("target", Vec3::new(0.0, 0.0, -3.0)).with_instance(InstanceId::new("a")));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hit = graph.pick_instance(&ray).unwrap();
        assert_eq!(hit.node, target);
        assert_eq!(hit.instance_id, Some(InstanceId::new("a")));
    }

    #[test]
    fn test_zero_hits_is_empty() {
        let mut graph = SceneGraph::new();
        graph.add(unit_box("box", Vec3::ZERO));
        let ray = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::Y);
        assert!(graph.intersect_ray(&ray).is_empty());
        assert!(graph.pick_instance(&ray).is_none());
    }

    #[test]
    fn test_scaled_node_hit_distance_in_world_units() {
        let mut graph = SceneGraph::new();
        graph.add(unit_box("big", Vec3::ZERO).with_transform(Transform::identity().with_scale(2.0)));
        let hits = graph.intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z));
        assert!((hits[0].distance - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_world_bounds_rotated() {
        let mut graph = SceneGraph::new();
        let node = graph.add(
            unit_box("box", Vec3::ZERO).with_transform(Transform::from_position_rotation(
                Vec3::ZERO,
                Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_4),
            )),
        );
        let bounds = graph.world_bounds(node).unwrap();
        assert!((bounds.half_extents().y - 0.5 * 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_take_dirty() {
        let mut graph = SceneGraph::new();
        let a = graph.add(SceneNode::new("a"));
        assert_eq!(graph.take_dirty(), vec![a]);
        assert!(graph.take_dirty().is_empty());
        graph.set_local_pose(a, Vec3::X, Quat::IDENTITY);
        assert_eq!(graph.get(a).unwrap().dirty(), DirtyFlags::TRANSFORM);
    }
}
