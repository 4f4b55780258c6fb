//! 3D Transform (position, rotation, scale)

use cagebox_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A transform with position, rotation, and uniform scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    /// Uniform scale factor
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create an identity transform (no translation, rotation, or scale change)
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Transform a point from local space to world space
    ///
    /// Applies scale, then rotation, then translation.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p * self.scale) + self.position
    }

    /// Transform a direction from local space to world space
    ///
    /// Applies scale and rotation, but not translation.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        self.rotation.rotate(d * self.scale)
    }

    /// Compute the inverse transform
    ///
    /// `transform.inverse().transform_point(transform.transform_point(p)) == p`
    pub fn inverse(&self) -> Self {
        let inv_scale = if self.scale.abs() > 1e-10 {
            1.0 / self.scale
        } else {
            1.0
        };
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_rotation.rotate(-self.position) * inv_scale;

        Self {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Compose two transforms: result = self * other
    ///
    /// The composed transform applies `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(other.position),
            rotation: (self.rotation * other.rotation).normalized(),
            scale: self.scale * other.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPSILON
    }

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(p), p);
    }

    #[test]
    fn test_transform_point_order() {
        let t = Transform::from_position_rotation(
            Vec3::new(0.0, 10.0, 0.0),
            Quat::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2),
        )
        .with_scale(2.0);
        // scale (2,0,0) -> rotate (0,0,-2) -> translate
        assert!(vec_approx_eq(t.transform_point(Vec3::X), Vec3::new(0.0, 10.0, -2.0)));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform::from_position_rotation(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_euler_xyz(0.3, 0.2, -0.8),
        )
        .with_scale(1.5);
        let p = Vec3::new(0.5, 0.25, -4.0);
        assert!(vec_approx_eq(t.inverse().transform_point(t.transform_point(p)), p));
    }

    #[test]
    fn test_compose() {
        let parent = Transform::from_position(Vec3::new(0.0, -2.0, 0.0));
        let child = Transform::from_position(Vec3::new(1.0, 0.15, 0.0));
        let world = parent.compose(&child);
        assert!(vec_approx_eq(world.position, Vec3::new(1.0, -1.85, 0.0)));
    }
}
