//! The cage: a static floor with four walls
//!
//! [`CageDimensions::slabs`] is the single source of the slab layout. Both
//! the compound collider and the render nodes are built from it, so the
//! visible walls and the collision walls always coincide.

use cagebox_math::{Quat, Vec3};
use cagebox_physics::{BodyKey, ColliderShape, RigidBody, Shape};
use serde::{Deserialize, Serialize};

use crate::geometry::GeometryDesc;
use crate::instance::Material;
use crate::scene_graph::{NodeKey, SceneGraph, SceneNode};
use crate::transform::Transform;
use crate::world::{RigidBodyWorld, WorldError};

/// Cage measurements in world units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CageDimensions {
    /// World position of the bottom centre of the floor
    pub origin: Vec3,
    /// Outer edge length of the square floor
    pub size: f32,
    pub base_height: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
}

impl Default for CageDimensions {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, -2.0, 0.0),
            size: 30.0,
            base_height: 0.3,
            wall_height: 3.5,
            wall_thickness: 0.3,
        }
    }
}

/// Which part of the cage a slab is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlabKind {
    Floor,
    Wall,
}

/// One box of the cage, relative to the cage origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CageSlab {
    pub kind: SlabKind,
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl CageDimensions {
    /// World height of the floor's top surface
    #[inline]
    pub fn floor_top(&self) -> f32 {
        self.origin.y + self.base_height
    }

    /// Half extent of the interior a spawned object may occupy
    pub fn safe_half_extent(&self) -> f32 {
        (self.size - 2.0 * self.wall_thickness) / 2.0
    }

    /// Floor then walls at -X, +X, -Z, +Z
    pub fn slabs(&self) -> [CageSlab; 5] {
        let half = self.size / 2.0;
        let wall_y = self.base_height + self.wall_height / 2.0;
        let wall_half_y = self.wall_height / 2.0;
        let wall_half_t = self.wall_thickness / 2.0;
        // Walls are centred on the floor edge
        let wall_offset = half;
        let x_wall = Vec3::new(wall_half_t, wall_half_y, half);
        let z_wall = Vec3::new(half, wall_half_y, wall_half_t);
        [
            CageSlab {
                kind: SlabKind::Floor,
                center: Vec3::new(0.0, self.base_height / 2.0, 0.0),
                half_extents: Vec3::new(half, self.base_height / 2.0, half),
            },
            CageSlab { kind: SlabKind::Wall, center: Vec3::new(-wall_offset, wall_y, 0.0), half_extents: x_wall },
            CageSlab { kind: SlabKind::Wall, center: Vec3::new(wall_offset, wall_y, 0.0), half_extents: x_wall },
            CageSlab { kind: SlabKind::Wall, center: Vec3::new(0.0, wall_y, -wall_offset), half_extents: z_wall },
            CageSlab { kind: SlabKind::Wall, center: Vec3::new(0.0, wall_y, wall_offset), half_extents: z_wall },
        ]
    }

    /// Whether a world position lies inside the walls horizontally
    pub fn contains_xz(&self, position: Vec3) -> bool {
        let limit = self.safe_half_extent();
        (position.x - self.origin.x).abs() <= limit && (position.z - self.origin.z).abs() <= limit
    }
}

/// Static compound body for the cage, plus its render nodes
#[derive(Debug)]
pub struct CageCompoundBody {
    dimensions: CageDimensions,
    key: Option<BodyKey>,
    group: Option<NodeKey>,
}

impl CageCompoundBody {
    pub fn new(dimensions: CageDimensions) -> Self {
        Self {
            dimensions,
            key: None,
            group: None,
        }
    }

    pub fn dimensions(&self) -> &CageDimensions {
        &self.dimensions
    }

    pub fn key(&self) -> Option<BodyKey> {
        self.key
    }

    pub fn group(&self) -> Option<NodeKey> {
        self.group
    }

    /// The static rigid body with one cuboid collider per slab
    pub fn build_body(&self) -> RigidBody {
        let colliders = self
            .dimensions
            .slabs()
            .iter()
            .map(|slab| ColliderShape::with_offset(Shape::cuboid(slab.half_extents), slab.center, Quat::IDENTITY))
            .collect();
        RigidBody::new_compound(colliders, 0.0).with_position(self.dimensions.origin)
    }

    /// Group node at the cage origin with one child per slab
    pub fn build_nodes(&mut self, graph: &mut SceneGraph) -> NodeKey {
        if let Some(group) = self.group.filter(|&g| graph.contains(g)) {
            return group;
        }
        let group = graph.add(SceneNode::new("cage").with_transform(Transform::from_position(self.dimensions.origin)));
        for (i, slab) in self.dimensions.slabs().iter().enumerate() {
            let (name, material) = match slab.kind {
                SlabKind::Floor => ("cage_floor".to_string(), Material::SADDLE_BROWN),
                SlabKind::Wall => (format!("cage_wall_{}", i), Material::SIENNA),
            };
            let node = SceneNode::new(name)
                .with_transform(Transform::from_position(slab.center))
                .with_geometry(GeometryDesc::Cuboid { half_extents: slab.half_extents })
                .with_material(material);
            graph.add_child(group, node);
        }
        self.group = Some(group);
        group
    }

    /// Add the collider to the world once and register it against the group
    /// node as a static pair
    pub fn mount(&mut self, world: &mut RigidBodyWorld, graph: &mut SceneGraph) -> Result<BodyKey, WorldError> {
        if let Some(key) = self.key {
            log::warn!("Cage body {:?} is already mounted", key);
            return Ok(key);
        }
        let group = self.build_nodes(graph);
        let key = world.add_body(self.build_body())?;
        world.register(key, group, true);
        log::info!(
            "Cage mounted: size {}, wall height {}, floor top {}",
            self.dimensions.size,
            self.dimensions.wall_height,
            self.dimensions.floor_top()
        );
        self.key = Some(key);
        Ok(key)
    }

    /// Remove the collider and the render nodes
    pub fn unmount(&mut self, world: &mut RigidBodyWorld, graph: &mut SceneGraph) {
        if let Some(key) = self.key.take() {
            world.unregister(key);
            world.remove_body(key);
        }
        if let Some(group) = self.group.take() {
            graph.remove(group);
        }
    }

    /// Rotate the rendered cage about Y
    ///
    /// Only the group node turns. The collider keeps its original
    /// orientation.
    pub fn set_visual_rotation(&self, graph: &mut SceneGraph, angle: f32) {
        if let Some(group) = self.group {
            graph.set_local_pose(group, self.dimensions.origin, Quat::from_axis_angle(Vec3::Y, angle));
        }
    }
}
