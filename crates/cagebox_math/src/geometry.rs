//! Rays and planes used for picking and drag solving

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// A half-line starting at `origin`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalized() }
    }

    /// Point at parameter `t` along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Plane defined by `dot(normal, p) = distance`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalized(), distance }
    }

    /// Horizontal plane at height `y`, facing up
    pub fn horizontal(y: f32) -> Self {
        Self { normal: Vec3::Y, distance: y }
    }

    /// Signed distance from the plane (positive on the normal side)
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.distance
    }

    /// Ray parameter where the ray meets the plane
    ///
    /// `None` when the ray is parallel to the plane or the plane lies behind
    /// the ray origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = -self.signed_distance(ray.origin) / denom;
        (t >= 0.0).then_some(t)
    }
}
