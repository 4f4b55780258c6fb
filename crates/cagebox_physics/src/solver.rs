//! Sequential-impulse contact solver
//!
//! Works on a dense copy of body velocities so the world's slotmap is only
//! touched once before and once after solving.

use cagebox_math::{Mat3, Vec3};

use crate::body::BodyKey;

/// Penetration tolerated without positional correction
pub(crate) const LINEAR_SLOP: f32 = 0.005;
/// Approach speed below which restitution is ignored
const RESTITUTION_THRESHOLD: f32 = 1.0;

/// Velocity state of one body during a solve
#[derive(Clone, Debug)]
pub(crate) struct SolverBody {
    pub key: BodyKey,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub inv_mass: f32,
    pub inv_inertia: Mat3,
}

impl SolverBody {
    fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }
}

/// Identity of a contact across steps for warm starting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ContactKey {
    pub a: BodyKey,
    pub b: BodyKey,
    pub child_a: u16,
    pub child_b: u16,
    pub feature: u32,
}

/// Per-step tuning shared by every constraint
#[derive(Clone, Copy, Debug)]
pub(crate) struct SolverParams {
    pub dt: f32,
    pub baumgarte: f32,
    pub softness: f32,
}

/// One contact point between bodies `a` and `b` (indices into the solver bodies)
#[derive(Clone, Debug)]
pub(crate) struct ContactConstraint {
    pub key: ContactKey,
    a: usize,
    b: usize,
    normal: Vec3,
    tangents: [Vec3; 2],
    r_a: Vec3,
    r_b: Vec3,
    normal_mass: f32,
    tangent_mass: [f32; 2],
    target_velocity: f32,
    friction: f32,
    /// Accumulated impulses: normal, tangent 1, tangent 2
    pub impulses: [f32; 3],
}

#[allow(clippy::too_many_arguments)]
impl ContactConstraint {
    pub fn new(
        bodies: &[SolverBody],
        a: usize,
        b: usize,
        key: ContactKey,
        point: Vec3,
        positions: (Vec3, Vec3),
        normal: Vec3,
        separation: f32,
        friction: f32,
        restitution: f32,
        params: &SolverParams,
    ) -> Self {
        let r_a = point - positions.0;
        let r_b = point - positions.1;
        let t1 = normal.any_orthogonal();
        let t2 = normal.cross(t1);

        let effective = |dir: Vec3| -> f32 {
            let (ba, bb) = (&bodies[a], &bodies[b]);
            let ra_x = r_a.cross(dir);
            let rb_x = r_b.cross(dir);
            ba.inv_mass
                + bb.inv_mass
                + ra_x.dot(ba.inv_inertia.mul_vec3(ra_x))
                + rb_x.dot(bb.inv_inertia.mul_vec3(rb_x))
        };
        let inv_or_zero = |k: f32| if k > 0.0 { 1.0 / k } else { 0.0 };

        let normal_mass = inv_or_zero(effective(normal) + params.softness);
        let tangent_mass = [inv_or_zero(effective(t1)), inv_or_zero(effective(t2))];

        let mut target_velocity = if separation > 0.0 {
            // Speculative: allow closing the gap this step, no further
            -separation / params.dt
        } else {
            params.baumgarte * (-separation - LINEAR_SLOP).max(0.0) / params.dt
        };

        let approach = (bodies[b].velocity_at(r_b) - bodies[a].velocity_at(r_a)).dot(normal);
        if restitution > 0.0 && approach < -RESTITUTION_THRESHOLD {
            target_velocity = target_velocity.max(-restitution * approach);
        }

        Self {
            key,
            a,
            b,
            normal,
            tangents: [t1, t2],
            r_a,
            r_b,
            normal_mass,
            tangent_mass,
            target_velocity,
            friction,
            impulses: [0.0; 3],
        }
    }

    fn apply(&self, bodies: &mut [SolverBody], impulse: Vec3) {
        let a = &mut bodies[self.a];
        a.linear_velocity -= impulse * a.inv_mass;
        a.angular_velocity -= a.inv_inertia.mul_vec3(self.r_a.cross(impulse));
        let b = &mut bodies[self.b];
        b.linear_velocity += impulse * b.inv_mass;
        b.angular_velocity += b.inv_inertia.mul_vec3(self.r_b.cross(impulse));
    }

    fn relative_velocity(&self, bodies: &[SolverBody]) -> Vec3 {
        bodies[self.b].velocity_at(self.r_b) - bodies[self.a].velocity_at(self.r_a)
    }

    /// Re-apply last step's impulses
    pub fn warm_start(&mut self, bodies: &mut [SolverBody], cached: [f32; 3]) {
        self.impulses = cached;
        let impulse = self.normal * cached[0]
            + self.tangents[0] * cached[1]
            + self.tangents[1] * cached[2];
        self.apply(bodies, impulse);
    }

    /// One Gauss-Seidel pass over this contact
    pub fn solve(&mut self, bodies: &mut [SolverBody]) {
        // Friction first, bounded by the current normal impulse
        let max_friction = self.friction * self.impulses[0];
        for k in 0..2 {
            let tangent = self.tangents[k];
            let vt = self.relative_velocity(bodies).dot(tangent);
            let lambda = -vt * self.tangent_mass[k];
            let old = self.impulses[k + 1];
            let new = (old + lambda).clamp(-max_friction, max_friction);
            self.impulses[k + 1] = new;
            self.apply(bodies, tangent * (new - old));
        }

        let vn = self.relative_velocity(bodies).dot(self.normal);
        let lambda = (self.target_velocity - vn) * self.normal_mass;
        let old = self.impulses[0];
        let new = (old + lambda).max(0.0);
        self.impulses[0] = new;
        self.apply(bodies, self.normal * (new - old));
    }
}
