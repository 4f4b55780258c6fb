//! Collision shapes
//!
//! Every non-spherical shape is represented as a convex polytope
//! ([`ConvexHull`]) built once in body space. Cylinders are approximated by
//! an N-sided prism; a cylinder with a zero top radius is a cone.

use cagebox_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Minimum number of sides for a cylinder polytope
pub const MIN_CYLINDER_SEGMENTS: u32 = 3;

/// A primitive collision shape in its own local frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    /// Cylinder along the local Y axis, centered on the origin
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
}

impl Shape {
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Self {
        Self::Cylinder {
            radius_top,
            radius_bottom,
            height,
            segments: segments.max(MIN_CYLINDER_SEGMENTS),
        }
    }

    /// Cone with its apex at +Y
    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        Self::cylinder(0.0, radius, height, segments)
    }

    /// Radius of a sphere around the local origin enclosing the shape
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Shape::Sphere { radius } => radius,
            Shape::Cuboid { half_extents } => half_extents.length(),
            Shape::Cylinder { radius_top, radius_bottom, height, .. } => {
                let r = radius_top.max(radius_bottom);
                (r * r + height * height * 0.25).sqrt()
            }
        }
    }

    /// Diagonal of the inertia tensor for a solid shape of `mass`
    pub fn local_inertia(&self, mass: f32) -> Vec3 {
        match *self {
            Shape::Sphere { radius } => Vec3::splat(0.4 * mass * radius * radius),
            Shape::Cuboid { half_extents: h } => Vec3::new(
                mass / 3.0 * (h.y * h.y + h.z * h.z),
                mass / 3.0 * (h.x * h.x + h.z * h.z),
                mass / 3.0 * (h.x * h.x + h.y * h.y),
            ),
            Shape::Cylinder { radius_top, radius_bottom, height, .. } => {
                let r = radius_top.max(radius_bottom);
                let side = mass / 12.0 * (3.0 * r * r + height * height);
                Vec3::new(side, 0.5 * mass * r * r, side)
            }
        }
    }

    /// Polytope representation, `None` for spheres
    pub fn hull(&self) -> Option<ConvexHull> {
        match *self {
            Shape::Sphere { .. } => None,
            Shape::Cuboid { half_extents } => Some(ConvexHull::cuboid(half_extents)),
            Shape::Cylinder { radius_top, radius_bottom, height, segments } => Some(
                ConvexHull::cylinder(radius_top, radius_bottom, height, segments),
            ),
        }
    }
}

/// Outward-facing plane of a polytope: `dot(normal, p) = offset`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Face {
    pub normal: Vec3,
    pub offset: f32,
}

impl Face {
    /// Signed distance of a point from the face plane (positive outside)
    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.offset
    }
}

/// Convex polytope given by its vertices and face planes
///
/// `polygons[i]` lists the vertex indices of `faces[i]` in boundary order.
/// `edges` holds every boundary edge once.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHull {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
    pub polygons: Vec<Vec<usize>>,
    pub edges: Vec<(usize, usize)>,
}

impl ConvexHull {
    fn from_parts(vertices: Vec<Vec3>, faces: Vec<Face>, polygons: Vec<Vec<usize>>) -> Self {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for polygon in &polygons {
            for (k, &i) in polygon.iter().enumerate() {
                let j = polygon[(k + 1) % polygon.len()];
                let edge = (i.min(j), i.max(j));
                if i != j && !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
        Self { vertices, faces, polygons, edges }
    }

    /// Box centered on the origin
    pub fn cuboid(h: Vec3) -> Self {
        let mut vertices = Vec::with_capacity(8);
        for &sx in &[-1.0, 1.0] {
            for &sy in &[-1.0, 1.0] {
                for &sz in &[-1.0, 1.0] {
                    vertices.push(Vec3::new(h.x * sx, h.y * sy, h.z * sz));
                }
            }
        }
        let faces = vec![
            Face { normal: Vec3::X, offset: h.x },
            Face { normal: -Vec3::X, offset: h.x },
            Face { normal: Vec3::Y, offset: h.y },
            Face { normal: -Vec3::Y, offset: h.y },
            Face { normal: Vec3::Z, offset: h.z },
            Face { normal: -Vec3::Z, offset: h.z },
        ];
        // Vertex index is 4*x + 2*y + z with 0 for the negative side
        let polygons = vec![
            vec![4, 5, 7, 6],
            vec![0, 1, 3, 2],
            vec![2, 3, 7, 6],
            vec![0, 1, 5, 4],
            vec![1, 3, 7, 5],
            vec![0, 2, 6, 4],
        ];
        Self::from_parts(vertices, faces, polygons)
    }

    /// Prism (or pyramid when one radius is zero) along local Y
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(MIN_CYLINDER_SEGMENTS) as usize;
        let half = height * 0.5;
        let ring = |y: f32, r: f32| -> Vec<Vec3> {
            if r <= f32::EPSILON {
                vec![Vec3::new(0.0, y, 0.0)]
            } else {
                (0..segments)
                    .map(|i| {
                        let a = i as f32 / segments as f32 * std::f32::consts::TAU;
                        Vec3::new(r * a.sin(), y, r * a.cos())
                    })
                    .collect()
            }
        };
        let top = ring(half, radius_top);
        let bottom = ring(-half, radius_bottom);
        // Top ring first, then bottom ring
        let (nt, nb) = (top.len(), bottom.len());

        let mut faces = Vec::with_capacity(segments + 2);
        let mut polygons = Vec::with_capacity(segments + 2);
        if nt > 1 {
            faces.push(Face { normal: Vec3::Y, offset: half });
            polygons.push((0..nt).collect());
        }
        if nb > 1 {
            faces.push(Face { normal: -Vec3::Y, offset: half });
            polygons.push((nt..nt + nb).collect());
        }

        // Any point strictly inside, used to orient side normals outward
        let inside = Vec3::ZERO;
        for i in 0..segments {
            let j = (i + 1) % segments;
            let (b0, b1) = (bottom[i % bottom.len()], bottom[j % bottom.len()]);
            let (t0, t1) = (top[i % top.len()], top[j % top.len()]);
            // One of the two edges may collapse to the apex
            let (p0, p1, p2) = if bottom.len() > 1 { (b0, b1, t0) } else { (t0, t1, b0) };
            let mut normal = (p1 - p0).cross(p2 - p0).normalized();
            if normal.dot(p0 - inside) < 0.0 {
                normal = -normal;
            }
            faces.push(Face { normal, offset: normal.dot(p0) });

            let mut polygon = vec![i % nt, j % nt, nt + j % nb, nt + i % nb];
            polygon.dedup();
            polygons.push(polygon);
        }

        let mut vertices = top;
        vertices.extend(bottom);
        Self::from_parts(vertices, faces, polygons)
    }

    /// Copy of the hull moved by a rotation then a translation
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Self {
        let vertices = self
            .vertices
            .iter()
            .map(|&v| rotation.rotate(v) + translation)
            .collect();
        let faces = self
            .faces
            .iter()
            .map(|f| {
                let normal = rotation.rotate(f.normal);
                Face { normal, offset: f.offset + normal.dot(translation) }
            })
            .collect();
        Self {
            vertices,
            faces,
            polygons: self.polygons.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Mean of the vertices; always inside the hull
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        self.vertices.iter().fold(Vec3::ZERO, |acc, &v| acc + v) / self.vertices.len() as f32
    }

    /// Smallest and largest projection of the vertices onto `axis`
    pub fn project(&self, axis: Vec3) -> (f32, f32) {
        self.vertices
            .iter()
            .map(|v| v.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)))
    }

    /// Vertex positions of a face in boundary order
    pub fn face_points(&self, face: usize) -> Vec<Vec3> {
        self.polygons
            .get(face)
            .map(|polygon| polygon.iter().map(|&i| self.vertices[i]).collect())
            .unwrap_or_default()
    }

    /// Largest signed face distance of `p` and the index of that face
    ///
    /// Negative when `p` is inside the hull; the magnitude is then the depth
    /// below the nearest face.
    pub fn max_separation(&self, p: Vec3) -> (f32, usize) {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (f.distance(p), i))
            .fold((f32::NEG_INFINITY, 0), |best, cur| if cur.0 > best.0 { cur } else { best })
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.max_separation(p).0 <= 0.0
    }

    /// Entry and exit ray parameters, or `None` on a miss
    ///
    /// `direction` need not be normalized; parameters are in its units.
    pub fn ray_interval(&self, origin: Vec3, direction: Vec3) -> Option<(f32, f32)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        for face in &self.faces {
            let denom = face.normal.dot(direction);
            let dist = face.distance(origin);
            if denom.abs() < 1e-9 {
                if dist > 0.0 {
                    return None;
                }
                continue;
            }
            let t = -dist / denom;
            if denom < 0.0 {
                t_enter = t_enter.max(t);
            } else {
                t_exit = t_exit.min(t);
            }
            if t_enter > t_exit {
                return None;
            }
        }
        (t_exit >= 0.0).then_some((t_enter, t_exit))
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self { min: center - half, max: center + half }
    }

    /// Smallest box containing all points (empty input gives a degenerate box at the origin)
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        };
        points.iter().skip(1).fold(Self::new(first, first), |acc, &p| Self {
            min: acc.min.min_components(p),
            max: acc.max.max_components(p),
        })
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min_components(other.min),
            max: self.max.max_components(other.max),
        }
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// One child of a body's collider set, placed relative to the body origin
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderShape {
    pub shape: Shape,
    pub offset: Vec3,
    pub rotation: Quat,
    hull: Option<ConvexHull>,
}

impl ColliderShape {
    /// Shape centered on the body origin
    pub fn new(shape: Shape) -> Self {
        Self::with_offset(shape, Vec3::ZERO, Quat::IDENTITY)
    }

    pub fn with_offset(shape: Shape, offset: Vec3, rotation: Quat) -> Self {
        Self { hull: shape.hull(), shape, offset, rotation }
    }

    /// Body-space polytope, `None` for spheres
    pub fn hull(&self) -> Option<&ConvexHull> {
        self.hull.as_ref()
    }

    /// Bounding radius measured from the body origin
    pub fn bounding_radius(&self) -> f32 {
        self.offset.length() + self.shape.bounding_radius()
    }
}
