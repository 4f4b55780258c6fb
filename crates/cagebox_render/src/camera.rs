//! Perspective camera
//!
//! The camera has a position and a quaternion orientation; it looks down
//! its local -Z axis with +Y up. It supports:
//! - Aiming at a point (`look_at`)
//! - Casting picking rays through normalized device coordinates
//! - Producing view/projection uniforms for the external renderer

use bytemuck::{Pod, Zeroable};
use cagebox_math::{mat4, Mat4, Quat, Ray, Vec2, Vec3};

/// Camera data laid out for a uniform buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    /// World position, w = 1
    pub position: [f32; 4],
}

/// Perspective camera
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 8.0))
    }
}

impl Camera {
    /// Camera at `position` looking down -Z with a 75 degree field of view
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            fov_y: 75f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn with_fov_degrees(mut self, degrees: f32) -> Self {
        self.fov_y = degrees.to_radians();
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Update the aspect ratio from a surface size; ignores empty sizes
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Orientation that aims the camera at `target`
    ///
    /// Returns the current orientation when `target` is the camera position.
    pub fn look_rotation_to(&self, target: Vec3) -> Quat {
        let dir = target - self.position;
        if dir.length_squared() < 1e-12 {
            return self.orientation;
        }
        Quat::look_rotation(dir, Vec3::Y)
    }

    /// Aim the camera at `target`
    pub fn look_at(&mut self, target: Vec3) {
        self.orientation = self.look_rotation_to(target);
    }

    /// Get the forward direction vector
    pub fn forward(&self) -> Vec3 {
        self.orientation.rotate(Vec3::new(0.0, 0.0, -1.0))
    }

    /// Get the right direction vector
    pub fn right(&self) -> Vec3 {
        self.orientation.rotate(Vec3::X)
    }

    /// Get the up direction vector
    pub fn up(&self) -> Vec3 {
        self.orientation.rotate(Vec3::Y)
    }

    /// Angle below the horizon the camera is looking, in radians
    ///
    /// Positive when looking down, zero when level.
    pub fn elevation(&self) -> f32 {
        (-self.forward().y).clamp(-1.0, 1.0).asin()
    }

    /// World-space ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let half_height = (self.fov_y * 0.5).tan();
        let half_width = half_height * self.aspect;
        let direction = self.forward() + self.right() * (ndc.x * half_width) + self.up() * (ndc.y * half_height);
        Ray::new(self.position, direction)
    }

    pub fn view_matrix(&self) -> Mat4 {
        mat4::view(self.position, self.orientation)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        mat4::perspective(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn uniforms(&self) -> CameraUniforms {
        CameraUniforms {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            position: [self.position.x, self.position.y, self.position.z, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_camera_default_position() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 0.0, 8.0));
        assert!((cam.fov_y - 75f32.to_radians()).abs() < 1e-6);
        assert!(vec_approx_eq(cam.forward(), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_look_at() {
        let mut cam = Camera::new(Vec3::new(0.0, 4.0, 4.0));
        cam.look_at(Vec3::ZERO);
        let expected = Vec3::new(0.0, -1.0, -1.0).normalized();
        assert!(vec_approx_eq(cam.forward(), expected));
        assert!((cam.elevation() - std::f32::consts::FRAC_PI_4).abs() < 1e-4);
        assert!(cam.up().y > 0.0);
    }

    #[test]
    fn test_look_at_self_keeps_orientation() {
        let mut cam = Camera::new(Vec3::ZERO);
        cam.look_at(Vec3::X);
        let before = cam.orientation;
        cam.look_at(Vec3::ZERO);
        assert_eq!(cam.orientation, before);
    }

    #[test]
    fn test_center_ray_is_forward() {
        let mut cam = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        cam.look_at(Vec3::new(0.0, 0.0, 0.0));
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!(vec_approx_eq(ray.direction, cam.forward()));
        assert_eq!(ray.origin, cam.position);
    }

    #[test]
    fn test_corner_ray_matches_fov() {
        let mut cam = Camera::default();
        cam.set_viewport(800.0, 400.0);
        let ray = cam.ray_from_ndc(Vec2::new(0.0, 1.0));
        let angle = ray.direction.dot(cam.forward()).acos();
        assert!((angle - cam.fov_y / 2.0).abs() < 1e-4);

        let ray = cam.ray_from_ndc(Vec2::new(1.0, 0.0));
        assert!(ray.direction.x > 0.0);
        let horizontal = (ray.direction.x / -ray.direction.z).atan();
        assert!((horizontal.tan() - 2.0 * (cam.fov_y / 2.0).tan()).abs() < 1e-4);
    }

    #[test]
    fn test_view_maps_position_to_origin() {
        let mut cam = Camera::new(Vec3::new(3.0, 1.0, -2.0));
        cam.look_at(Vec3::new(0.0, 0.0, 0.0));
        let p = mat4::transform_point(cam.view_matrix(), cam.position);
        assert!(vec_approx_eq(p, Vec3::ZERO));
        let ahead = mat4::transform_point(cam.view_matrix(), cam.position + cam.forward());
        assert!(vec_approx_eq(ahead, Vec3::new(0.0, 0.0, -1.0)));
    }
}
