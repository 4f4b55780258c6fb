//! Contact generation
//!
//! Narrowphase tests between world-space shapes plus collision filtering
//! via layer masks. All contact normals point from the first shape toward
//! the second, and `separation` is negative while the shapes overlap.
//! Contacts are reported up to a `margin` of positive separation so the
//! solver can stop fast bodies before they pass through thin geometry.

use bitflags::bitflags;
use cagebox_math::{Quat, Vec3};

use crate::shapes::{Aabb, ConvexHull};

bitflags! {
    /// Collision layers for filtering which objects can collide
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CollisionLayer: u32 {
        /// Spawned sandbox objects
        const DEFAULT = 1 << 0;
        /// Static world geometry (the cage)
        const STATIC = 1 << 1;
        /// All layers (collide with everything)
        const ALL = 0xFFFFFFFF;
    }
}

/// Collision filter determining what an object collides with
///
/// Two objects A and B collide if:
/// - (A.layer & B.mask) != 0, AND
/// - (B.layer & A.mask) != 0
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    /// Which layer(s) this object belongs to
    pub layer: CollisionLayer,
    /// Which layer(s) this object can collide with
    pub mask: CollisionLayer,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layer: CollisionLayer::DEFAULT,
            mask: CollisionLayer::ALL,
        }
    }
}

impl CollisionFilter {
    /// Create a new collision filter with specified layer and mask
    pub fn new(layer: CollisionLayer, mask: CollisionLayer) -> Self {
        Self { layer, mask }
    }

    /// Check if this filter allows collision with another filter
    pub fn collides_with(&self, other: &Self) -> bool {
        self.layer.intersects(other.mask) && other.layer.intersects(self.mask)
    }

    /// Filter for static world geometry
    ///
    /// Static geometry never needs to touch other static geometry.
    pub fn static_world() -> Self {
        Self {
            layer: CollisionLayer::STATIC,
            mask: CollisionLayer::ALL & !CollisionLayer::STATIC,
        }
    }
}

/// Contact information from a collision
#[derive(Clone, Copy, Debug)]
pub struct Contact {
    /// Contact point in world space
    pub point: Vec3,
    /// Unit normal pointing from the first shape toward the second
    pub normal: Vec3,
    /// Signed distance along the normal (negative means overlapping)
    pub separation: f32,
    /// Stable id of the feature pair, used to match contacts across steps
    pub feature: u32,
}

impl Contact {
    pub fn new(point: Vec3, normal: Vec3, separation: f32, feature: u32) -> Self {
        Self { point, normal, separation, feature }
    }

    /// Check if this represents an actual collision (overlap)
    pub fn is_colliding(&self) -> bool {
        self.separation < 0.0
    }

    /// Same contact seen from the other shape
    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// A collider placed in world space for one step
#[derive(Clone, Debug)]
pub enum WorldShape {
    Sphere { center: Vec3, radius: f32 },
    /// Oriented box, kept separately from its hull for exact sphere tests
    Cuboid {
        center: Vec3,
        rotation: Quat,
        half_extents: Vec3,
        hull: ConvexHull,
    },
    Hull(ConvexHull),
}

impl WorldShape {
    pub fn aabb(&self) -> Aabb {
        match self {
            WorldShape::Sphere { center, radius } => {
                Aabb::from_center_half_extents(*center, Vec3::splat(*radius))
            }
            WorldShape::Cuboid { hull, .. } | WorldShape::Hull(hull) => hull.aabb(),
        }
    }

    fn hull(&self) -> Option<&ConvexHull> {
        match self {
            WorldShape::Sphere { .. } => None,
            WorldShape::Cuboid { hull, .. } | WorldShape::Hull(hull) => Some(hull),
        }
    }
}

/// Generate contacts between two world shapes, appending to `out`
pub fn shape_contacts(a: &WorldShape, b: &WorldShape, margin: f32, out: &mut Vec<Contact>) {
    match (a, b) {
        (
            WorldShape::Sphere { center: ca, radius: ra },
            WorldShape::Sphere { center: cb, radius: rb },
        ) => out.extend(sphere_vs_sphere(*ca, *ra, *cb, *rb, margin)),
        (WorldShape::Sphere { center, radius }, other) => {
            out.extend(sphere_vs_shape(*center, *radius, other, margin).map(Contact::flipped))
        }
        (other, WorldShape::Sphere { center, radius }) => {
            out.extend(sphere_vs_shape(*center, *radius, other, margin))
        }
        (a, b) => {
            if let (Some(ha), Some(hb)) = (a.hull(), b.hull()) {
                hull_vs_hull(ha, hb, margin, out);
            }
        }
    }
}

/// Dispatch a sphere against a box or polytope; normal points toward the sphere
fn sphere_vs_shape(center: Vec3, radius: f32, shape: &WorldShape, margin: f32) -> Option<Contact> {
    match shape {
        WorldShape::Cuboid { center: bc, rotation, half_extents, .. } => {
            sphere_vs_box(center, radius, *bc, *rotation, *half_extents, margin)
        }
        WorldShape::Hull(hull) => sphere_vs_hull(center, radius, hull, margin),
        WorldShape::Sphere { center: other, radius: r } => {
            sphere_vs_sphere(*other, *r, center, radius, margin)
        }
    }
}

/// Sphere vs sphere (normal from A toward B)
pub fn sphere_vs_sphere(ca: Vec3, ra: f32, cb: Vec3, rb: f32, margin: f32) -> Option<Contact> {
    let delta = cb - ca;
    let dist = delta.length();
    let separation = dist - ra - rb;
    if separation > margin {
        return None;
    }
    let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };
    Some(Contact::new(ca + normal * ra, normal, separation, 0))
}

/// Sphere vs oriented box (normal from the box toward the sphere)
pub fn sphere_vs_box(
    center: Vec3,
    radius: f32,
    box_center: Vec3,
    rotation: Quat,
    half: Vec3,
    margin: f32,
) -> Option<Contact> {
    let local = rotation.conjugate().rotate(center - box_center);
    let clamped = Vec3::new(
        local.x.clamp(-half.x, half.x),
        local.y.clamp(-half.y, half.y),
        local.z.clamp(-half.z, half.z),
    );

    let (local_normal, separation, feature) = if clamped == local {
        // Center inside the box: push out through the nearest face
        let depths = [
            (half.x - local.x.abs(), Vec3::X * local.x.signum(), 0),
            (half.y - local.y.abs(), Vec3::Y * local.y.signum(), 1),
            (half.z - local.z.abs(), Vec3::Z * local.z.signum(), 2),
        ];
        let (depth, n, axis) = depths
            .into_iter()
            .fold(depths[0], |best, cur| if cur.0 < best.0 { cur } else { best });
        (n, -depth - radius, axis)
    } else {
        let d = local - clamped;
        let dist = d.length();
        (d / dist, dist - radius, 3)
    };

    if separation > margin {
        return None;
    }
    let normal = rotation.rotate(local_normal);
    Some(Contact::new(center - normal * radius, normal, separation, feature))
}

/// Sphere vs convex polytope (normal from the hull toward the sphere)
///
/// Uses the face of greatest separation, which is exact on faces and
/// conservative near edges.
pub fn sphere_vs_hull(center: Vec3, radius: f32, hull: &ConvexHull, margin: f32) -> Option<Contact> {
    let (distance, face) = hull.max_separation(center);
    let separation = distance - radius;
    if separation > margin || hull.faces.is_empty() {
        return None;
    }
    let normal = hull.faces[face].normal;
    Some(Contact::new(center - normal * radius, normal, separation, face as u32))
}

/// A second-hull face must beat the first hull's by this much to become the reference
const FACE_TOLERANCE: f32 = 1e-3;
/// Edge axes only win when clearly shallower than every face axis
const EDGE_TOLERANCE: f32 = 1e-2;
/// Cross products shorter than this come from parallel edges
const PARALLEL_EPSILON: f32 = 1e-4;
/// Upper bound on contacts kept from one clipped face
const MAX_FACE_CONTACTS: usize = 8;

/// Feature bits telling contact sources apart across steps
const REFERENCE_ON_SECOND: u32 = 1 << 16;
const EDGE_CONTACT: u32 = 1 << 17;

/// Best edge-pair axis found by the separating axis test
#[derive(Clone, Copy, Debug)]
struct EdgeAxis {
    /// Unit axis from the first hull toward the second
    normal: Vec3,
    separation: f32,
    dir_a: Vec3,
    dir_b: Vec3,
}

/// Polytope vs polytope by the separating axis test
///
/// Candidate axes are the face normals of both hulls and the cross products
/// of their edge directions. The axis with the greatest separation picks the
/// contact feature: a face axis clips the most anti-parallel face of the
/// other hull against the reference face, an edge axis gives the closest
/// points of the two supporting edges.
pub fn hull_vs_hull(a: &ConvexHull, b: &ConvexHull, margin: f32, out: &mut Vec<Contact>) {
    if a.faces.is_empty() || b.faces.is_empty() {
        return;
    }
    let (sep_a, face_a) = face_axis(a, b);
    if sep_a > margin {
        return;
    }
    let (sep_b, face_b) = face_axis(b, a);
    if sep_b > margin {
        return;
    }
    let edge = edge_axis(a, b);
    if edge.is_some_and(|e| e.separation > margin) {
        return;
    }

    let face_separation = sep_a.max(sep_b);
    match edge {
        Some(e) if e.separation > face_separation + EDGE_TOLERANCE => edge_contact(a, b, &e, out),
        _ if sep_b > sep_a + FACE_TOLERANCE => clip_contacts(b, face_b, a, margin, true, out),
        _ => clip_contacts(a, face_a, b, margin, false, out),
    }
}

/// Greatest separation of `other` from any face plane of `reference`
fn face_axis(reference: &ConvexHull, other: &ConvexHull) -> (f32, usize) {
    reference
        .faces
        .iter()
        .enumerate()
        .map(|(i, face)| (other.project(face.normal).0 - face.offset, i))
        .fold((f32::NEG_INFINITY, 0), |best, cur| if cur.0 > best.0 { cur } else { best })
}

/// Edge directions of a hull with parallel duplicates removed
fn edge_directions(hull: &ConvexHull) -> Vec<Vec3> {
    let mut directions: Vec<Vec3> = Vec::new();
    for &(i, j) in &hull.edges {
        let d = (hull.vertices[j] - hull.vertices[i]).normalized();
        if !directions.iter().any(|e| e.dot(d).abs() > 1.0 - 1e-5) {
            directions.push(d);
        }
    }
    directions
}

fn edge_axis(a: &ConvexHull, b: &ConvexHull) -> Option<EdgeAxis> {
    let offset = b.centroid() - a.centroid();
    let dirs_b = edge_directions(b);
    let mut best: Option<EdgeAxis> = None;

    for dir_a in edge_directions(a) {
        for &dir_b in &dirs_b {
            let axis = dir_a.cross(dir_b);
            let len = axis.length();
            if len < PARALLEL_EPSILON {
                continue;
            }
            // Ties go to the centroid direction
            let mut normal = axis / len;
            if normal.dot(offset) < 0.0 {
                normal = -normal;
            }
            let (min_a, max_a) = a.project(normal);
            let (min_b, max_b) = b.project(normal);
            let mut separation = min_b - max_a;
            let reverse = min_a - max_b;
            if reverse > separation + 1e-6 {
                normal = -normal;
                separation = reverse;
            }
            if best.map_or(true, |e| separation > e.separation) {
                best = Some(EdgeAxis { normal, separation, dir_a, dir_b });
            }
        }
    }
    best
}

/// Edge of `hull` parallel to `direction` lying furthest along `normal`
fn support_edge(hull: &ConvexHull, direction: Vec3, normal: Vec3) -> Option<(usize, Vec3, Vec3)> {
    hull.edges
        .iter()
        .enumerate()
        .map(|(k, &(i, j))| (k, hull.vertices[i], hull.vertices[j]))
        .filter(|&(_, p, q)| (q - p).normalized().dot(direction).abs() > 1.0 - 1e-4)
        .max_by(|x, y| {
            let dx = normal.dot(x.1 + x.2);
            let dy = normal.dot(y.1 + y.2);
            dx.total_cmp(&dy)
        })
}

fn edge_contact(a: &ConvexHull, b: &ConvexHull, axis: &EdgeAxis, out: &mut Vec<Contact>) {
    let (Some((ka, p1, q1)), Some((kb, p2, q2))) = (
        support_edge(a, axis.dir_a, axis.normal),
        support_edge(b, axis.dir_b, -axis.normal),
    ) else {
        return;
    };
    let (on_a, on_b) = closest_points_segments(p1, q1, p2, q2);
    let feature = EDGE_CONTACT | ((ka as u32 & 0xff) << 8) | (kb as u32 & 0xff);
    out.push(Contact::new((on_a + on_b) * 0.5, axis.normal, axis.separation, feature));
}

/// Closest points between segments `p1 q1` and `p2 q2`
fn closest_points_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);
    if a < 1e-12 || e < 1e-12 {
        return (p1, p2);
    }
    let b = d1.dot(d2);
    let c = d1.dot(r);
    let denom = a * e - b * b;
    let mut s = if denom.abs() > 1e-12 { ((b * f - c * e) / denom).clamp(0.0, 1.0) } else { 0.0 };
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }
    (p1 + d1 * s, p2 + d2 * t)
}

/// Clip the incident face of `incident` against face `ref_face` of `reference`
///
/// `flipped` is set when the reference hull is the second shape of the pair,
/// so the reported normal still points from the first shape to the second.
fn clip_contacts(
    reference: &ConvexHull,
    ref_face: usize,
    incident: &ConvexHull,
    margin: f32,
    flipped: bool,
    out: &mut Vec<Contact>,
) {
    let face = reference.faces[ref_face];
    let n = face.normal;
    let Some(incident_face) = (0..incident.faces.len())
        .min_by(|&i, &j| incident.faces[i].normal.dot(n).total_cmp(&incident.faces[j].normal.dot(n)))
    else {
        return;
    };

    let reference_points = reference.face_points(ref_face);
    let center = reference_points.iter().fold(Vec3::ZERO, |acc, &p| acc + p)
        / reference_points.len().max(1) as f32;
    let mut polygon = incident.face_points(incident_face);
    for (k, &p) in reference_points.iter().enumerate() {
        let q = reference_points[(k + 1) % reference_points.len()];
        let mut side = (q - p).cross(n);
        if side.dot(center - p) > 0.0 {
            side = -side;
        }
        polygon = clip_polygon(&polygon, side, side.dot(p));
        if polygon.is_empty() {
            break;
        }
    }

    if polygon.len() > MAX_FACE_CONTACTS {
        let stride = polygon.len() as f32 / MAX_FACE_CONTACTS as f32;
        polygon = (0..MAX_FACE_CONTACTS).map(|k| polygon[(k as f32 * stride) as usize]).collect();
    }

    let normal = if flipped { -n } else { n };
    let side_bit = if flipped { REFERENCE_ON_SECOND } else { 0 };
    let base = side_bit | ((ref_face as u32 & 0xff) << 8);
    let before = out.len();
    for (k, &point) in polygon.iter().enumerate() {
        let separation = face.distance(point);
        if separation <= margin {
            out.push(Contact::new(point, normal, separation, base | k as u32));
        }
    }

    // Numerical corner cases can clip everything away; keep the deepest vertex
    if out.len() == before {
        let deepest = incident
            .vertices
            .iter()
            .map(|&v| (face.distance(v), v))
            .min_by(|x, y| x.0.total_cmp(&y.0));
        if let Some((separation, point)) = deepest.filter(|d| d.0 <= margin) {
            out.push(Contact::new(point, normal, separation, base | 0xff));
        }
    }
}

/// Keep the part of a convex polygon where `dot(normal, p) <= offset`
fn clip_polygon(points: &[Vec3], normal: Vec3, offset: f32) -> Vec<Vec3> {
    let mut clipped = Vec::with_capacity(points.len() + 1);
    for (k, &p) in points.iter().enumerate() {
        let q = points[(k + 1) % points.len()];
        let dp = normal.dot(p) - offset;
        let dq = normal.dot(q) - offset;
        if dp <= 0.0 {
            clipped.push(p);
        }
        if (dp < 0.0 && dq > 0.0) || (dp > 0.0 && dq < 0.0) {
            clipped.push(p + (q - p) * (dp / (dp - dq)));
        }
    }
    clipped
}
