//! 3x3 matrices for inertia tensors and rotation bases

use serde::{Deserialize, Serialize};

use crate::{Quat, Vec3};

/// 3x3 matrix stored as three column vectors
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub cols: [Vec3; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const IDENTITY: Self = Self { cols: [Vec3::X, Vec3::Y, Vec3::Z] };
    pub const ZERO: Self = Self { cols: [Vec3::ZERO; 3] };

    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Diagonal matrix
    #[inline]
    pub const fn from_diagonal(d: Vec3) -> Self {
        Self::from_cols(
            Vec3::new(d.x, 0.0, 0.0),
            Vec3::new(0.0, d.y, 0.0),
            Vec3::new(0.0, 0.0, d.z),
        )
    }

    /// Rotation matrix of a unit quaternion
    pub fn from_quat(q: Quat) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        Self::from_cols(
            Vec3::new(1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy)),
            Vec3::new(2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx)),
            Vec3::new(2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy)),
        )
    }

    /// Row `i` as a vector
    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        match i {
            0 => Vec3::new(self.cols[0].x, self.cols[1].x, self.cols[2].x),
            1 => Vec3::new(self.cols[0].y, self.cols[1].y, self.cols[2].y),
            _ => Vec3::new(self.cols[0].z, self.cols[1].z, self.cols[2].z),
        }
    }

    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2))
    }

    /// Matrix-vector product
    #[inline]
    pub fn mul_vec3(&self, v: Vec3) -> Vec3 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }

    /// Matrix product `self * other`
    pub fn mul_mat3(&self, other: &Self) -> Self {
        Self::from_cols(
            self.mul_vec3(other.cols[0]),
            self.mul_vec3(other.cols[1]),
            self.mul_vec3(other.cols[2]),
        )
    }

    /// `R * D * R^T`, used to move a body-space inertia tensor into world space
    pub fn rotate_tensor(rotation: Quat, diagonal: Vec3) -> Self {
        let r = Self::from_quat(rotation);
        r.mul_mat3(&Self::from_diagonal(diagonal)).mul_mat3(&r.transpose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mul() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat3::IDENTITY.mul_vec3(v), v);
    }

    #[test]
    fn test_from_quat_matches_rotate() {
        let q = Quat::from_euler_xyz(0.3, 0.5, -1.2);
        let v = Vec3::new(-1.0, 0.5, 2.0);
        let m = Mat3::from_quat(q);
        assert!((m.mul_vec3(v) - q.rotate(v)).length() < 1e-5);
    }

    #[test]
    fn test_transpose() {
        let m = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        let t = m.transpose();
        assert_eq!(t.cols[0], Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn test_rotate_tensor_isotropic_is_unchanged() {
        let q = Quat::from_euler_xyz(1.0, 2.0, 0.5);
        let m = Mat3::rotate_tensor(q, Vec3::splat(2.0));
        let v = Vec3::new(1.0, -1.0, 0.5);
        assert!((m.mul_vec3(v) - v * 2.0).length() < 1e-4);
    }
}
