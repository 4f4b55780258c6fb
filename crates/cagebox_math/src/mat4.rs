//! 4x4 matrix helpers for camera uniforms
//!
//! Column-major, matching what a GPU uniform buffer expects.

use crate::{Mat3, Quat, Vec3};

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Right-handed perspective projection with a [0, 1] depth range
///
/// `fov_y` is in radians.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y * 0.5).tan();
    let range = far - near;
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, -far / range, -1.0],
        [0.0, 0.0, -(far * near) / range, 0.0],
    ]
}

/// View matrix for a camera at `position` with `orientation`
///
/// This is the inverse of the camera's world transform.
pub fn view(position: Vec3, orientation: Quat) -> Mat4 {
    let r = Mat3::from_quat(orientation.conjugate());
    let t = r.mul_vec3(-position);
    [
        [r.cols[0].x, r.cols[0].y, r.cols[0].z, 0.0],
        [r.cols[1].x, r.cols[1].y, r.cols[1].z, 0.0],
        [r.cols[2].x, r.cols[2].y, r.cols[2].z, 0.0],
        [t.x, t.y, t.z, 1.0],
    ]
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a point (w = 1) and apply the perspective divide
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    let x = m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0];
    let y = m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1];
    let z = m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2];
    let w = m[0][3] * p.x + m[1][3] * p.y + m[2][3] * p.z + m[3][3];
    if w.abs() > f32::EPSILON {
        Vec3::new(x / w, y / w, z / w)
    } else {
        Vec3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_mul_identity() {
        let p = perspective(1.0, 1.5, 0.1, 100.0);
        assert_eq!(mul(IDENTITY, p), p);
        assert_eq!(mul(p, IDENTITY), p);
    }

    #[test]
    fn test_view_moves_camera_to_origin() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let q = Quat::from_euler_xyz(0.2, 0.7, 0.0);
        let v = view(eye, q);
        assert!(vec_approx_eq(transform_point(v, eye), Vec3::ZERO));
        // A point straight ahead of the camera ends up on -Z in view space
        let ahead = eye + q.rotate(-Vec3::Z) * 5.0;
        assert!(vec_approx_eq(transform_point(v, ahead), Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn test_perspective_depth_range() {
        let p = perspective(1.2, 1.0, 0.1, 1000.0);
        let near = transform_point(p, Vec3::new(0.0, 0.0, -0.1));
        let far = transform_point(p, Vec3::new(0.0, 0.0, -1000.0));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }
}
