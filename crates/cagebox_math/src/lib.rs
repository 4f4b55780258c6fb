//! 3D Mathematics Library
//!
//! Vector, rotation, and ray types shared by the cagebox physics, scene and
//! camera crates.
//!
//! ## Core Types
//!
//! - [`Vec2`] - 2D vector, used for screen and normalized device coordinates
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Quat`] - Unit quaternion rotation
//! - [`Mat3`] - 3x3 matrix (inertia tensors, rotation bases)
//! - [`Mat4`] - 4x4 column-major matrix for camera uniforms
//!
//! ## Geometry
//!
//! - [`Ray`] - Half-line with origin and direction
//! - [`Plane`] - Infinite plane `dot(normal, p) = distance`

mod vec2;
mod vec3;
mod quat;
mod mat3;
pub mod mat4;
pub mod geometry;

pub use vec2::Vec2;
pub use vec3::Vec3;
pub use quat::Quat;
pub use mat3::Mat3;
pub use mat4::Mat4;
pub use geometry::{Plane, Ray};
