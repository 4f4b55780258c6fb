//! Spawned sandbox objects
//!
//! An [`Object3DInstance`] is the record an instance data source hands to
//! the core. It is read when the body is created and never written back by
//! the simulation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use cagebox_math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable identifier of a spawned instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an id of the form `instance-<millis>-<suffix>`
    pub fn generate(created_at_ms: u64) -> Self {
        let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("instance-{}-{}", created_at_ms, to_base36(n)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Kinds of shape an instance can take
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Box,
    Sphere,
    Torus,
    Cone,
    Cylinder,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Torus,
        ShapeKind::Cone,
        ShapeKind::Cylinder,
    ];
}

/// A simple material with just a base color
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Base color as RGBA (each component 0.0-1.0)
    pub base_color: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Material {
    pub const WHITE: Self = Self { base_color: [1.0, 1.0, 1.0, 1.0] };
    /// Cage floor
    pub const SADDLE_BROWN: Self = Self { base_color: [0.545, 0.271, 0.075, 1.0] };
    /// Cage walls
    pub const SIENNA: Self = Self { base_color: [0.627, 0.322, 0.176, 1.0] };

    /// Create a new opaque material with the given RGB color
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { base_color: [r, g, b, 1.0] }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| -> Option<f32> {
            let byte = u8::from_str_radix(digits.get(i..i + 2)?, 16).ok()?;
            Some(byte as f32 / 255.0)
        };
        Some(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// A spawned shape as described by the instance data source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object3DInstance {
    pub id: InstanceId,
    pub shape_type: ShapeKind,
    /// `#rrggbb`
    pub color: String,
    /// Initial world position
    pub position: Vec3,
    /// Initial XYZ Euler rotation in radians
    #[serde(default)]
    pub rotation: Vec3,
    pub size: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub animation_speed: f32,
    /// Creation time in milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: u64,
}

fn default_scale() -> f32 {
    1.0
}

impl Object3DInstance {
    pub fn new(id: impl Into<InstanceId>, shape_type: ShapeKind, position: Vec3, size: f32) -> Self {
        Self {
            id: id.into(),
            shape_type,
            color: "#ffffff".to_string(),
            position,
            rotation: Vec3::ZERO,
            size,
            scale: 1.0,
            animation_speed: 0.0,
            created_at: 0,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_rotation(mut self, euler: Vec3) -> Self {
        self.rotation = euler;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Initial orientation from the Euler rotation
    pub fn orientation(&self) -> Quat {
        Quat::from_euler_xyz(self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Render material; unparsable colors fall back to white
    pub fn material(&self) -> Material {
        Material::from_hex(&self.color).unwrap_or_else(|| {
            log::warn!("instance {} has invalid color {:?}", self.id, self.color);
            Material::WHITE
        })
    }

    /// Size after scaling, the edge length the collider is built from
    pub fn scaled_size(&self) -> f32 {
        self.size * self.scale
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = InstanceId::generate(1_700_000_000_000);
        let b = InstanceId::generate(1_700_000_000_000);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("instance-1700000000000-"));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_material_from_hex() {
        let m = Material::from_hex("#FF8000").unwrap();
        assert_eq!(m.base_color[0], 1.0);
        assert!((m.base_color[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(m.base_color[2], 0.0);
        assert!(Material::from_hex("#12345").is_none());
        assert!(Material::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn test_invalid_color_falls_back_to_white() {
        let instance = Object3DInstance::new("a", ShapeKind::Box, Vec3::ZERO, 1.0).with_color("teal");
        assert_eq!(instance.material(), Material::WHITE);
    }

    #[test]
    fn test_shape_kind_serde_names() {
        let s = ron::to_string(&ShapeKind::Cylinder).unwrap();
        assert_eq!(s, "cylinder");
    }

    #[test]
    fn test_instance_ron_defaults() {
        let text = r##"(
            id: "instance-1-a",
            shape_type: sphere,
            color: "#00ff00",
            position: (x: 0.0, y: 5.0, z: 0.0),
            size: 1.0,
        )"##;
        let instance: Object3DInstance = ron::from_str(text).unwrap();
        assert_eq!(instance.scale, 1.0);
        assert_eq!(instance.rotation, Vec3::ZERO);
        assert_eq!(instance.shape_type, ShapeKind::Sphere);
    }
}
