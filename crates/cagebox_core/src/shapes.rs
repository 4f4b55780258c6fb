//! Shape factory
//!
//! Maps an instance's [`ShapeKind`] to the pair of descriptors the rest of
//! the system needs: a physics collider and a render geometry. The render
//! geometry is in the node's unscaled frame (the node carries the instance
//! scale); the collider is already scaled.
//!
//! Two kinds are approximated physically:
//! - a cone collides as a cylinder with zero top radius
//! - a torus collides as a flattened box enclosing the ring, with no hole

use cagebox_math::Vec3;
use cagebox_physics::Shape;

use crate::geometry::GeometryDesc;
use crate::instance::{Object3DInstance, ShapeKind};

/// Radial segments used for cylinders and cones
pub const CYLINDER_SEGMENTS: u32 = 16;
/// Cylinder and cone height relative to size
pub const CYLINDER_HEIGHT_FACTOR: f32 = 1.5;

/// Collider, geometry and mass for one instance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeDescriptor {
    pub collider: Shape,
    pub geometry: GeometryDesc,
    pub mass: f32,
}

impl ShapeKind {
    /// Default dynamic mass for this kind
    pub fn mass(&self) -> f32 {
        match self {
            ShapeKind::Cone => 6.0,
            _ => 5.0,
        }
    }

    /// Build the collider and geometry for an instance of this kind
    pub fn describe(&self, size: f32, scale: f32) -> ShapeDescriptor {
        let s = size * scale;
        let (collider, geometry) = match self {
            ShapeKind::Box => (
                Shape::cuboid(Vec3::splat(s * 0.5)),
                GeometryDesc::Cuboid { half_extents: Vec3::splat(size * 0.5) },
            ),
            ShapeKind::Sphere => (
                Shape::sphere(s * 0.5),
                GeometryDesc::Sphere { radius: size * 0.5 },
            ),
            ShapeKind::Cylinder => (
                Shape::cylinder(s * 0.5, s * 0.5, s * CYLINDER_HEIGHT_FACTOR, CYLINDER_SEGMENTS),
                GeometryDesc::Cylinder {
                    radius_top: size * 0.5,
                    radius_bottom: size * 0.5,
                    height: size * CYLINDER_HEIGHT_FACTOR,
                    segments: CYLINDER_SEGMENTS,
                },
            ),
            ShapeKind::Cone => (
                Shape::cone(s * 0.5, s * CYLINDER_HEIGHT_FACTOR, CYLINDER_SEGMENTS),
                GeometryDesc::Cylinder {
                    radius_top: 0.0,
                    radius_bottom: size * 0.5,
                    height: size * CYLINDER_HEIGHT_FACTOR,
                    segments: CYLINDER_SEGMENTS,
                },
            ),
            ShapeKind::Torus => (
                Shape::cuboid(Vec3::new(s * 0.75, s * 0.3, s * 0.75)),
                GeometryDesc::Torus { major_radius: size * 0.45, minor_radius: size * 0.3 },
            ),
        };
        ShapeDescriptor { collider, geometry, mass: self.mass() }
    }
}

impl Object3DInstance {
    /// Descriptors for this instance's shape, size and scale
    pub fn descriptor(&self) -> ShapeDescriptor {
        self.shape_type.describe(self.size, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_descriptor() {
        let d = ShapeKind::Box.describe(1.0, 2.0);
        assert_eq!(d.mass, 5.0);
        assert_eq!(d.collider, Shape::cuboid(Vec3::splat(1.0)));
        assert_eq!(d.geometry, GeometryDesc::Cuboid { half_extents: Vec3::splat(0.5) });
    }

    #[test]
    fn test_cone_is_cylinder_with_zero_top() {
        let d = ShapeKind::Cone.describe(1.0, 1.0);
        assert_eq!(d.mass, 6.0);
        match d.collider {
            Shape::Cylinder { radius_top, radius_bottom, height, segments } => {
                assert_eq!(radius_top, 0.0);
                assert_eq!(radius_bottom, 0.5);
                assert_eq!(height, 1.5);
                assert_eq!(segments, CYLINDER_SEGMENTS);
            }
            other => panic!("expected cylinder collider, got {:?}", other),
        }
    }

    #[test]
    fn test_torus_is_flattened_box() {
        let d = ShapeKind::Torus.describe(1.0, 1.0);
        assert_eq!(d.collider, Shape::cuboid(Vec3::new(0.75, 0.3, 0.75)));
    }

    #[test]
    fn test_collider_matches_scaled_geometry_bounds() {
        for kind in ShapeKind::ALL {
            let scale = 1.3;
            let d = kind.describe(0.8, scale);
            let geometry_half = d.geometry.local_bounds().half_extents() * scale;
            let collider_half = match d.collider {
                Shape::Cuboid { half_extents } => half_extents,
                Shape::Sphere { radius } => Vec3::splat(radius),
                Shape::Cylinder { radius_top, radius_bottom, height, .. } => {
                    let r = radius_top.max(radius_bottom);
                    Vec3::new(r, height * 0.5, r)
                }
            };
            assert!((geometry_half - collider_half).length() < 1e-5, "{:?}", kind);
        }
    }
}
