//! Physics world and simulation

use std::collections::HashMap;

use cagebox_math::Vec3;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::body::{BodyKey, RigidBody};
use crate::broadphase::BroadphaseKind;
use crate::collision::{shape_contacts, Contact, WorldShape};
use crate::material::ContactMaterial;
use crate::shapes::{Aabb, Shape};
use crate::solver::{ContactConstraint, ContactKey, SolverBody, SolverParams};

/// Base speculative margin added to every pair
const CONTACT_MARGIN: f32 = 0.02;

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (applied to Y-axis, negative = down)
    pub gravity: f32,
    /// Length of one simulation substep in seconds
    pub fixed_timestep: f32,
    /// Catch-up substeps allowed per call to [`PhysicsWorld::step_fixed`]
    pub max_substeps: u32,
    /// Gauss-Seidel iterations per substep
    pub solver_iterations: u32,
    pub broadphase: BroadphaseKind,
    /// Fraction of linear velocity lost per second
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second
    pub angular_damping: f32,
    pub contact_material: ContactMaterial,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 10,
            solver_iterations: 10,
            broadphase: BroadphaseKind::Naive,
            linear_damping: 0.01,
            angular_damping: 0.01,
            contact_material: ContactMaterial::default(),
        }
    }
}

impl PhysicsConfig {
    /// Create a new physics config with the given gravity
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }
}

/// The physics world containing all rigid bodies
pub struct PhysicsWorld {
    /// All rigid bodies in the world (using generational keys)
    bodies: SlotMap<BodyKey, RigidBody>,
    /// Physics configuration
    pub config: PhysicsConfig,
    /// Real time not yet consumed by fixed substeps
    accumulator: f32,
    /// Total simulated time in seconds
    simulated_time: f64,
    /// Impulses from the previous substep, keyed by contact identity
    warm_start: HashMap<ContactKey, [f32; 3]>,
    /// Contacts found during the last substep
    contacts: Vec<(BodyKey, BodyKey, Contact)>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            bodies: SlotMap::with_key(),
            config,
            accumulator: 0.0,
            simulated_time: 0.0,
            warm_start: HashMap::new(),
            contacts: Vec::new(),
        }
    }

    /// Add a body to the world and return its key
    pub fn add_body(&mut self, body: RigidBody) -> BodyKey {
        self.bodies.insert(body)
    }

    /// Remove a body from the world and return it
    pub fn remove_body(&mut self, key: BodyKey) -> Option<RigidBody> {
        let removed = self.bodies.remove(key);
        if removed.is_some() {
            self.warm_start.retain(|k, _| k.a != key && k.b != key);
            self.contacts.retain(|(a, b, _)| *a != key && *b != key);
        }
        removed
    }

    /// Get an immutable reference to a body by key
    pub fn get_body(&self, key: BodyKey) -> Option<&RigidBody> {
        self.bodies.get(key)
    }

    /// Get a mutable reference to a body by key
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        self.bodies.get_mut(key)
    }

    pub fn contains(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    /// Get the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Iterate over all body keys
    pub fn body_keys(&self) -> impl Iterator<Item = BodyKey> + '_ {
        self.bodies.keys()
    }

    /// Total simulated time in seconds
    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }

    /// Contacts found during the last substep
    pub fn contacts(&self) -> &[(BodyKey, BodyKey, Contact)] {
        &self.contacts
    }

    /// Advance by a real frame delta using fixed substeps
    ///
    /// Runs as many `fixed_timestep` substeps as the accumulated time allows,
    /// up to `max_substeps`. Time left over beyond the cap is dropped rather
    /// than carried into the next frame, so a long stall never triggers a
    /// burst of catch-up work. Returns the number of substeps executed.
    pub fn step_fixed(&mut self, frame_dt: f32) -> u32 {
        let dt = self.config.fixed_timestep;
        if dt <= 0.0 || !frame_dt.is_finite() {
            return 0;
        }
        self.accumulator += frame_dt.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= dt && substeps < self.config.max_substeps {
            self.step(dt);
            self.accumulator -= dt;
            substeps += 1;
        }
        self.accumulator %= dt;

        if substeps == self.config.max_substeps {
            log::trace!("physics hit the substep cap for frame dt {frame_dt:.4}");
        }
        substeps
    }

    /// Step the physics simulation forward by exactly `dt` seconds
    ///
    /// This performs:
    /// 1. Gravity and damping on dynamic bodies
    /// 2. Broadphase over motion-expanded bounds
    /// 3. Contact generation with speculative margins
    /// 4. Warm-started sequential impulses
    /// 5. Position and orientation integration
    pub fn step(&mut self, dt: f32) {
        let keys: Vec<BodyKey> = self.bodies.keys().collect();

        // Phase 1: external forces into a dense velocity copy
        let linear_keep = (1.0 - self.config.linear_damping).clamp(0.0, 1.0).powf(dt);
        let angular_keep = (1.0 - self.config.angular_damping).clamp(0.0, 1.0).powf(dt);
        let mut solver_bodies: Vec<SolverBody> = Vec::with_capacity(keys.len());
        for &key in &keys {
            let body = &self.bodies[key];
            let (mut linear, mut angular) = (body.linear_velocity, body.angular_velocity);
            if !body.is_static() {
                linear.y += self.config.gravity * dt;
                linear *= linear_keep;
                angular *= angular_keep;
            }
            solver_bodies.push(SolverBody {
                key,
                linear_velocity: linear,
                angular_velocity: angular,
                inv_mass: body.inv_mass(),
                inv_inertia: body.world_inv_inertia(),
            });
        }

        // Phase 2: world-space shapes and swept bounds
        let shapes: Vec<Vec<WorldShape>> = keys.iter().map(|&k| world_shapes(&self.bodies[k])).collect();
        let motion: Vec<f32> = keys
            .iter()
            .zip(&solver_bodies)
            .map(|(&k, sb)| {
                let radius = self.bodies[k].bounding_radius();
                (sb.linear_velocity.length() + sb.angular_velocity.length() * radius) * dt
            })
            .collect();
        let bounds: Vec<Aabb> = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| shapes_aabb(s).expanded(motion[i] + CONTACT_MARGIN))
            .collect();

        let pairs: Vec<(usize, usize)> = self
            .config
            .broadphase
            .find_pairs(&bounds)
            .into_iter()
            .filter(|&(i, j)| {
                let (a, b) = (&self.bodies[keys[i]], &self.bodies[keys[j]]);
                !(a.is_static() && b.is_static()) && a.filter.collides_with(&b.filter)
            })
            .collect();

        // Phase 3: narrowphase into constraints
        let contact_material = self.config.contact_material;
        let params = SolverParams {
            dt,
            baumgarte: contact_material.baumgarte(),
            softness: contact_material.softness(dt),
        };
        let mut constraints = Vec::new();
        let mut found = Vec::new();
        let mut scratch = Vec::new();
        for (i, j) in pairs {
            let (key_a, key_b) = (keys[i], keys[j]);
            let (body_a, body_b) = (&self.bodies[key_a], &self.bodies[key_b]);
            let surface = match (body_a.material, body_b.material) {
                (None, None) => contact_material.surface(),
                (Some(m), None) | (None, Some(m)) => m.combine(&contact_material.surface()),
                (Some(a), Some(b)) => a.combine(&b),
            };
            let margin = CONTACT_MARGIN + motion[i] + motion[j];

            for (ci, shape_a) in shapes[i].iter().enumerate() {
                for (cj, shape_b) in shapes[j].iter().enumerate() {
                    scratch.clear();
                    shape_contacts(shape_a, shape_b, margin, &mut scratch);
                    for contact in &scratch {
                        let key = ContactKey {
                            a: key_a,
                            b: key_b,
                            child_a: ci as u16,
                            child_b: cj as u16,
                            feature: contact.feature,
                        };
                        constraints.push(ContactConstraint::new(
                            &solver_bodies,
                            i,
                            j,
                            key,
                            contact.point,
                            (body_a.position, body_b.position),
                            contact.normal,
                            contact.separation,
                            surface.friction,
                            surface.restitution,
                            &params,
                        ));
                        found.push((key_a, key_b, *contact));
                    }
                }
            }
        }

        // Phase 4: solve
        for constraint in &mut constraints {
            if let Some(&cached) = self.warm_start.get(&constraint.key) {
                constraint.warm_start(&mut solver_bodies, cached);
            }
        }
        for _ in 0..self.config.solver_iterations {
            for constraint in &mut constraints {
                constraint.solve(&mut solver_bodies);
            }
        }
        self.warm_start = constraints.iter().map(|c| (c.key, c.impulses)).collect();
        self.contacts = found;

        // Phase 5: write back and integrate
        for solved in &solver_bodies {
            let body = &mut self.bodies[solved.key];
            if body.is_static() {
                continue;
            }
            body.linear_velocity = solved.linear_velocity;
            body.angular_velocity = solved.angular_velocity;
            body.position += body.linear_velocity * dt;
            body.orientation = body.orientation.integrate(body.angular_velocity, dt);
        }

        self.simulated_time += dt as f64;
    }
}

/// Place every collider of a body in world space
fn world_shapes(body: &RigidBody) -> Vec<WorldShape> {
    body.colliders()
        .iter()
        .map(|collider| {
            let center = body.position + body.orientation.rotate(collider.offset);
            let rotation = body.orientation * collider.rotation;
            match (collider.shape, collider.hull()) {
                (Shape::Sphere { radius }, _) => WorldShape::Sphere { center, radius },
                (Shape::Cuboid { half_extents }, Some(hull)) => WorldShape::Cuboid {
                    center,
                    rotation,
                    half_extents,
                    hull: hull.transformed(rotation, center),
                },
                (_, Some(hull)) => WorldShape::Hull(hull.transformed(rotation, center)),
                (_, None) => WorldShape::Sphere { center, radius: collider.shape.bounding_radius() },
            }
        })
        .collect()
}

fn shapes_aabb(shapes: &[WorldShape]) -> Aabb {
    shapes
        .iter()
        .map(WorldShape::aabb)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| Aabb::new(Vec3::ZERO, Vec3::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ColliderShape;
    use cagebox_math::Quat;

    const FLOOR_TOP: f32 = -1.7;

    fn floor_body() -> RigidBody {
        RigidBody::new(Shape::cuboid(Vec3::new(15.0, 0.15, 15.0)), 0.0)
            .with_position(Vec3::new(0.0, FLOOR_TOP - 0.15, 0.0))
    }

    fn run(world: &mut PhysicsWorld, seconds: f32) {
        let steps = (seconds * 60.0) as usize;
        for _ in 0..steps {
            world.step(1.0 / 60.0);
        }
    }

    #[test]
    fn test_add_remove_body() {
        let mut world = PhysicsWorld::new();
        let key = world.add_body(RigidBody::new(Shape::sphere(0.5), 1.0));
        assert_eq!(world.body_count(), 1);
        assert!(world.contains(key));
        assert!(world.remove_body(key).is_some());
        assert!(world.get_body(key).is_none());
        assert!(world.remove_body(key).is_none());
    }

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, -9.82);
        assert_eq!(config.max_substeps, 10);
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(config.broadphase, BroadphaseKind::Naive);
    }

    #[test]
    fn test_gravity_free_fall() {
        let mut world = PhysicsWorld::with_config(PhysicsConfig {
            linear_damping: 0.0,
            ..Default::default()
        });
        let key = world.add_body(RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(0.0, 10.0, 0.0)));
        run(&mut world, 1.0);
        let body = world.get_body(key).unwrap();
        assert!((body.linear_velocity.y + 9.82).abs() < 1e-3);
        assert!(body.position.y < 6.0);
    }

    #[test]
    fn test_static_body_never_moves() {
        let mut world = PhysicsWorld::new();
        let floor = world.add_body(floor_body());
        world.add_body(RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(0.0, 0.0, 0.0)));
        run(&mut world, 2.0);
        let body = world.get_body(floor).unwrap();
        assert_eq!(body.position, Vec3::new(0.0, FLOOR_TOP - 0.15, 0.0));
        assert_eq!(body.orientation, Quat::IDENTITY);
    }

    #[test]
    fn test_step_fixed_caps_substeps() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.step_fixed(1.0), 10);
        assert!((world.simulated_time() - 10.0 / 60.0).abs() < 1e-6);
        // Excess beyond the cap is dropped, not carried over
        assert_eq!(world.step_fixed(0.0), 0);
    }

    #[test]
    fn test_step_fixed_accumulates_small_frames() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.step_fixed(1.0 / 120.0), 0);
        assert_eq!(world.step_fixed(1.0 / 120.0 + 1e-5), 1);
    }

    #[test]
    fn test_sphere_comes_to_rest_on_floor() {
        let mut world = PhysicsWorld::new();
        world.add_body(floor_body());
        let ball = world.add_body(RigidBody::new(Shape::sphere(0.5), 5.0).with_position(Vec3::new(0.0, 2.0, 0.0)));
        run(&mut world, 4.0);
        let body = world.get_body(ball).unwrap();
        assert!((body.position.y - (FLOOR_TOP + 0.5)).abs() < 0.02, "y = {}", body.position.y);
        assert!(body.linear_velocity.length() < 0.05);
    }

    #[test]
    fn test_fast_body_does_not_tunnel() {
        let mut world = PhysicsWorld::new();
        world.add_body(floor_body());
        let bullet = world.add_body(
            RigidBody::new(Shape::cuboid(Vec3::splat(0.1)), 1.0)
                .with_position(Vec3::new(0.0, 3.0, 0.0))
                .with_velocity(Vec3::new(0.0, -80.0, 0.0)),
        );
        run(&mut world, 1.0);
        let body = world.get_body(bullet).unwrap();
        assert!(body.position.y > FLOOR_TOP, "tunneled to y = {}", body.position.y);
    }

    #[test]
    fn test_dynamic_box_rests_on_dynamic_box() {
        let mut world = PhysicsWorld::new();
        world.add_body(floor_body());
        let cube = || RigidBody::new(Shape::cuboid(Vec3::splat(0.5)), 5.0);
        let lower = world.add_body(cube().with_position(Vec3::new(0.0, FLOOR_TOP + 0.51, 0.0)));
        let upper = world.add_body(cube().with_position(Vec3::new(0.0, FLOOR_TOP + 2.0, 0.0)));
        run(&mut world, 4.0);

        let lower_y = world.get_body(lower).unwrap().position.y;
        let upper_body = world.get_body(upper).unwrap();
        assert!((lower_y - (FLOOR_TOP + 0.5)).abs() < 0.05, "lower y = {}", lower_y);
        assert!((upper_body.position.y - (FLOOR_TOP + 1.5)).abs() < 0.05, "upper y = {}", upper_body.position.y);
        assert!(upper_body.position.x.abs() < 0.05 && upper_body.position.z.abs() < 0.05);

        let stacked: Vec<_> = world
            .contacts()
            .iter()
            .filter(|(a, b, _)| (*a == lower && *b == upper) || (*a == upper && *b == lower))
            .collect();
        assert!(stacked.len() >= 4, "face contact expected, got {}", stacked.len());
        for (_, _, contact) in stacked {
            assert!(contact.normal.y.abs() > 0.99, "normal {:?}", contact.normal);
        }
    }

    #[test]
    fn test_compound_static_walls_contain_body() {
        let mut world = PhysicsWorld::new();
        let walls = RigidBody::new_compound(
            vec![
                ColliderShape::new(Shape::cuboid(Vec3::new(5.0, 0.15, 5.0))),
                ColliderShape::with_offset(
                    Shape::cuboid(Vec3::new(0.15, 2.0, 5.0)),
                    Vec3::new(2.0, 2.0, 0.0),
                    Quat::IDENTITY,
                ),
            ],
            0.0,
        );
        world.add_body(walls);
        let ball = world.add_body(
            RigidBody::new(Shape::sphere(0.3), 1.0)
                .with_position(Vec3::new(0.0, 0.5, 0.0))
                .with_velocity(Vec3::new(20.0, 0.0, 0.0)),
        );
        run(&mut world, 1.0);
        let body = world.get_body(ball).unwrap();
        assert!(body.position.x < 2.0, "escaped to x = {}", body.position.x);
    }

    #[test]
    fn test_contacts_recorded() {
        let mut world = PhysicsWorld::new();
        world.add_body(floor_body());
        world.add_body(
            RigidBody::new(Shape::cuboid(Vec3::splat(0.5)), 5.0).with_position(Vec3::new(0.0, FLOOR_TOP + 0.5, 0.0)),
        );
        world.step(1.0 / 60.0);
        assert_eq!(world.contacts().len(), 4);
    }
}
