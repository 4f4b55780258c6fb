//! Render geometry descriptors
//!
//! Describes what a node looks like in its own local (unscaled) frame. The
//! external renderer builds meshes from these; the core uses them for
//! hit-testing and bounds.

use cagebox_math::Vec3;
use cagebox_physics::{Aabb, ConvexHull};
use serde::{Deserialize, Serialize};

/// Sphere-tracing iteration cap for implicit surfaces
const MAX_MARCH_STEPS: usize = 128;
/// Surface distance treated as a hit while sphere tracing
const MARCH_EPSILON: f32 = 1e-4;

/// Local-space geometry of a renderable node
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometryDesc {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Along local Y; a zero top radius is a cone
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
    /// Ring lying in the local XZ plane
    Torus { major_radius: f32, minor_radius: f32 },
}

impl GeometryDesc {
    /// Local bounds
    pub fn local_bounds(&self) -> Aabb {
        let half = match *self {
            GeometryDesc::Cuboid { half_extents } => half_extents,
            GeometryDesc::Sphere { radius } => Vec3::splat(radius),
            GeometryDesc::Cylinder { radius_top, radius_bottom, height, .. } => {
                let r = radius_top.max(radius_bottom);
                Vec3::new(r, height * 0.5, r)
            }
            GeometryDesc::Torus { major_radius, minor_radius } => {
                let r = major_radius + minor_radius;
                Vec3::new(r, minor_radius, r)
            }
        };
        Aabb::from_center_half_extents(Vec3::ZERO, half)
    }

    /// Nearest ray parameter at which a local-space ray meets the surface
    ///
    /// `direction` need not be unit length; the result is in its units.
    /// Rays starting inside report the exit point.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match *self {
            GeometryDesc::Cuboid { half_extents } => {
                hull_hit(&ConvexHull::cuboid(half_extents), origin, direction)
            }
            GeometryDesc::Sphere { radius } => sphere_hit(radius, origin, direction),
            GeometryDesc::Cylinder { radius_top, radius_bottom, height, segments } => hull_hit(
                &ConvexHull::cylinder(radius_top, radius_bottom, height, segments),
                origin,
                direction,
            ),
            GeometryDesc::Torus { major_radius, minor_radius } => {
                torus_hit(major_radius, minor_radius, &self.local_bounds(), origin, direction)
            }
        }
    }
}

fn hull_hit(hull: &ConvexHull, origin: Vec3, direction: Vec3) -> Option<f32> {
    let (enter, exit) = hull.ray_interval(origin, direction)?;
    Some(if enter >= 0.0 { enter } else { exit })
}

fn sphere_hit(radius: f32, origin: Vec3, direction: Vec3) -> Option<f32> {
    let a = direction.length_squared();
    let b = origin.dot(direction);
    let c = origin.length_squared() - radius * radius;
    let disc = b * b - a * c;
    if disc < 0.0 || a <= 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = (-b - root) / a;
    let far = (-b + root) / a;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

fn torus_sdf(major: f32, minor: f32, p: Vec3) -> f32 {
    let ring = (p.x * p.x + p.z * p.z).sqrt() - major;
    (ring * ring + p.y * p.y).sqrt() - minor
}

/// Sphere tracing inside the torus bounds
fn torus_hit(major: f32, minor: f32, bounds: &Aabb, origin: Vec3, direction: Vec3) -> Option<f32> {
    let speed = direction.length();
    if speed <= 0.0 {
        return None;
    }
    let box_hull = ConvexHull::cuboid(bounds.half_extents());
    let (enter, exit) = box_hull.ray_interval(origin, direction)?;
    let mut t = enter.max(0.0);
    for _ in 0..MAX_MARCH_STEPS {
        if t > exit {
            return None;
        }
        let d = torus_sdf(major, minor, origin + direction * t);
        if d < MARCH_EPSILON {
            return Some(t);
        }
        t += d / speed;
    }
    None
}
