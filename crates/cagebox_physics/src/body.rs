//! Rigid body types

use cagebox_math::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::collision::CollisionFilter;
use crate::material::PhysicsMaterial;
use crate::shapes::{Aabb, ColliderShape, Shape};

// Define generational key type for rigid bodies
new_key_type! {
    /// Key to a rigid body in the physics world
    ///
    /// Uses generational indexing so that a key to a removed body returns
    /// None instead of pointing at whatever reused the slot.
    pub struct BodyKey;
}

/// Whether a body is simulated or fixed in place
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    #[default]
    Dynamic,
    Static,
}

/// A rigid body: pose, velocities, mass properties and collider set
///
/// Static-ness is fixed at construction (`mass <= 0`) and cannot change.
#[derive(Clone, Debug)]
pub struct RigidBody {
    /// World position of the body origin (also its center of mass)
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Linear velocity (units per second)
    pub linear_velocity: Vec3,
    /// Angular velocity (radians per second, world axes)
    pub angular_velocity: Vec3,
    /// Surface override; `None` uses the world's contact material
    pub material: Option<PhysicsMaterial>,
    /// Collision layer membership
    pub filter: CollisionFilter,
    mass: f32,
    inv_mass: f32,
    inv_inertia_local: Vec3,
    colliders: Vec<ColliderShape>,
    is_static: bool,
}

impl RigidBody {
    /// Create a body with a single shape; `mass <= 0` makes it static
    pub fn new(shape: Shape, mass: f32) -> Self {
        Self::new_compound(vec![ColliderShape::new(shape)], mass)
    }

    /// Create a body carrying several shapes; `mass <= 0` makes it static
    ///
    /// Dynamic compounds split the mass evenly between children for the
    /// inertia estimate.
    pub fn new_compound(colliders: Vec<ColliderShape>, mass: f32) -> Self {
        let is_static = mass <= 0.0;
        let (mass, inv_mass, inv_inertia_local) = if is_static || colliders.is_empty() {
            (0.0, 0.0, Vec3::ZERO)
        } else {
            let share = mass / colliders.len() as f32;
            let inertia = colliders.iter().fold(Vec3::ZERO, |acc, c| {
                let d = c.offset;
                let parallel = Vec3::new(
                    d.y * d.y + d.z * d.z,
                    d.x * d.x + d.z * d.z,
                    d.x * d.x + d.y * d.y,
                ) * share;
                acc + c.shape.local_inertia(share) + parallel
            });
            let inv = |i: f32| if i > 0.0 { 1.0 / i } else { 0.0 };
            (
                mass,
                1.0 / mass,
                Vec3::new(inv(inertia.x), inv(inertia.y), inv(inertia.z)),
            )
        };

        let filter = if is_static {
            CollisionFilter::static_world()
        } else {
            CollisionFilter::default()
        };

        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            material: None,
            filter,
            mass,
            inv_mass,
            inv_inertia_local,
            colliders,
            is_static,
        }
    }

    /// Set the initial position of this body
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial orientation of this body
    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation.normalized();
        self
    }

    /// Set the initial linear velocity (ignored for static bodies)
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        if !self.is_static {
            self.linear_velocity = velocity;
        }
        self
    }

    /// Give this body its own surface material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = Some(material);
        self
    }

    /// Set the collision filter
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn body_type(&self) -> BodyType {
        if self.is_static {
            BodyType::Static
        } else {
            BodyType::Dynamic
        }
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn colliders(&self) -> &[ColliderShape] {
        &self.colliders
    }

    /// Teleport the body
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalized();
    }

    /// Zero both linear and angular velocity
    pub fn clear_velocity(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
    }

    /// Apply an instantaneous impulse at `world_point` (the center of mass
    /// when `None`). No effect on static bodies.
    pub fn apply_impulse(&mut self, impulse: Vec3, world_point: Option<Vec3>) {
        if self.is_static {
            return;
        }
        self.linear_velocity += impulse * self.inv_mass;
        if let Some(point) = world_point {
            let r = point - self.position;
            self.angular_velocity += self.world_inv_inertia().mul_vec3(r.cross(impulse));
        }
    }

    /// Inverse inertia tensor in world space
    pub fn world_inv_inertia(&self) -> Mat3 {
        if self.is_static {
            return Mat3::ZERO;
        }
        Mat3::rotate_tensor(self.orientation, self.inv_inertia_local)
    }

    /// Velocity of the material point currently at `world_point`
    pub fn velocity_at(&self, world_point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(world_point - self.position)
    }

    /// Radius around the body origin enclosing every collider
    pub fn bounding_radius(&self) -> f32 {
        self.colliders
            .iter()
            .map(ColliderShape::bounding_radius)
            .fold(0.0, f32::max)
    }

    /// World-space bounds of all colliders at the current pose
    pub fn aabb(&self) -> Aabb {
        let mut bounds: Option<Aabb> = None;
        for collider in &self.colliders {
            let center = self.position + self.orientation.rotate(collider.offset);
            let child = match collider.hull() {
                Some(hull) => hull
                    .transformed(self.orientation * collider.rotation, center)
                    .aabb(),
                None => Aabb::from_center_half_extents(
                    center,
                    Vec3::splat(collider.shape.bounding_radius()),
                ),
            };
            bounds = Some(match bounds {
                Some(b) => b.union(&child),
                None => child,
            });
        }
        bounds.unwrap_or_else(|| Aabb::new(self.position, self.position))
    }

    /// Kinetic energy, handy for settling checks
    pub fn kinetic_energy(&self) -> f32 {
        if self.is_static {
            return 0.0;
        }
        let inv = self.inv_inertia_local;
        let local_w = self.orientation.conjugate().rotate(self.angular_velocity);
        let inertia = |i: f32| if i > 0.0 { 1.0 / i } else { 0.0 };
        let rot = inertia(inv.x) * local_w.x * local_w.x
            + inertia(inv.y) * local_w.y * local_w.y
            + inertia(inv.z) * local_w.z * local_w.z;
        0.5 * self.mass * self.linear_velocity.length_squared() + 0.5 * rot
    }
}
