//! Unit quaternion rotations
//!
//! Hamilton convention, `q * p` applies `p` first. Euler angles follow the
//! XYZ order used by the scene description (`q = qx * qy * qz`).

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::{Mat3, Vec3};

/// Rotation quaternion with vector part (x, y, z) and scalar part w
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around a unit `axis`
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Rotation from XYZ Euler angles in radians
    pub fn from_euler_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_axis_angle(Vec3::X, x)
            * Self::from_axis_angle(Vec3::Y, y)
            * Self::from_axis_angle(Vec3::Z, z)
    }

    /// Rotation from an orthonormal basis given as matrix columns
    pub fn from_mat3(m: &Mat3) -> Self {
        let (m00, m01, m02) = (m.cols[0].x, m.cols[1].x, m.cols[2].x);
        let (m10, m11, m12) = (m.cols[0].y, m.cols[1].y, m.cols[2].y);
        let (m20, m21, m22) = (m.cols[0].z, m.cols[1].z, m.cols[2].z);
        let trace = m00 + m11 + m22;

        let q = if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m21 - m12) * s, (m02 - m20) * s, (m10 - m01) * s, 0.25 / s)
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalized()
    }

    /// Orientation whose -Z axis points along `forward`, with `up` as the
    /// vertical hint. Falls back to X as the right axis when `forward` is
    /// parallel to `up`.
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Self {
        let back = (-forward).normalized();
        if back == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let mut right = up.cross(back);
        if right.length_squared() < 1e-12 {
            right = Vec3::X;
        }
        let right = right.normalized();
        let true_up = back.cross(right);
        Self::from_mat3(&Mat3::from_cols(right, true_up, back))
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit length (identity for a zero quaternion)
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            let inv = 1.0 / len;
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Conjugate, the inverse of a unit quaternion
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Inverse rotation
    #[inline]
    pub fn inverse(self) -> Self {
        self.normalized().conjugate()
    }

    /// Rotate a vector
    #[inline]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Advance the orientation by angular velocity `omega` over `dt`
    pub fn integrate(self, omega: Vec3, dt: f32) -> Self {
        let spin = Self::new(omega.x, omega.y, omega.z, 0.0) * self;
        let h = 0.5 * dt;
        Self::new(
            self.x + spin.x * h,
            self.y + spin.y * h,
            self.z + spin.z * h,
            self.w + spin.w * h,
        )
        .normalized()
    }

    /// Shortest-arc spherical interpolation
    pub fn slerp(self, other: Self, t: f32) -> Self {
        let mut end = other;
        let mut cos_theta = self.dot(other);
        if cos_theta < 0.0 {
            end = Self::new(-other.x, -other.y, -other.z, -other.w);
            cos_theta = -cos_theta;
        }

        let (s0, s1) = if cos_theta > 0.9995 {
            // Nearly parallel: nlerp avoids dividing by a tiny sine
            (1.0 - t, t)
        } else {
            let theta0 = cos_theta.clamp(-1.0, 1.0).acos();
            let sin_theta0 = theta0.sin();
            let theta = theta0 * t;
            (
                theta.cos() - cos_theta * theta.sin() / sin_theta0,
                theta.sin() / sin_theta0,
            )
        };

        Self::new(
            self.x * s0 + end.x * s1,
            self.y * s0 + end.y * s1,
            self.z * s0 + end.z * s1,
            self.w * s0 + end.w * s1,
        )
        .normalized()
    }

    /// Angle in radians between two orientations
    pub fn angle_to(self, other: Self) -> f32 {
        let d = self.dot(other).abs().min(1.0);
        2.0 * d.acos()
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;
    #[inline]
    fn mul(self, b: Self) -> Self {
        let a = self;
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}
