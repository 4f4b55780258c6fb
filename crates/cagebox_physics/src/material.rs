//! Surface and contact materials
//!
//! Most bodies carry no material of their own and use the world's
//! [`ContactMaterial`]. A body with a [`PhysicsMaterial`] overrides the
//! friction and restitution of every contact it takes part in.

use serde::{Deserialize, Serialize};

/// Per-body surface override
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Coulomb coefficient, 0 slides freely
    pub friction: f32,
    /// 0 absorbs the impact, 1 returns it fully
    pub restitution: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self::GRIPPY
    }
}

impl PhysicsMaterial {
    /// Matches the default contact material
    pub const GRIPPY: Self = Self {
        friction: 0.98,
        restitution: 0.0,
    };

    /// Slides across the cage floor
    pub const SLICK: Self = Self {
        friction: 0.05,
        restitution: 0.1,
    };

    /// Bounces off walls and other shapes
    pub const BOUNCY: Self = Self {
        friction: 0.6,
        restitution: 0.8,
    };

    /// Both coefficients clamped to [0, 1]
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction: friction.clamp(0.0, 1.0),
            restitution: restitution.clamp(0.0, 1.0),
        }
    }

    /// Surface used for a contact between two materials
    ///
    /// Friction is the geometric mean; the bouncier side wins restitution.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: (self.friction * other.friction).sqrt(),
            restitution: self.restitution.max(other.restitution),
        }
    }
}

/// Parameters of the contact constraint used when neither body carries its
/// own [`PhysicsMaterial`]
///
/// Stiffness and relaxation are expressed the SPOOK way: stiffness in N/m,
/// relaxation as the number of steps over which a penetration is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
    pub contact_stiffness: f32,
    pub contact_relaxation: f32,
}

impl Default for ContactMaterial {
    /// Grippy, dead contacts that keep thin floor slabs from being
    /// visibly penetrated
    fn default() -> Self {
        Self {
            friction: 0.98,
            restitution: 0.0,
            contact_stiffness: 1e8,
            contact_relaxation: 4.0,
        }
    }
}

impl ContactMaterial {
    /// Fraction of the remaining penetration removed per step
    pub fn baumgarte(&self) -> f32 {
        1.0 / self.contact_relaxation.max(1.0)
    }

    /// Constraint softness added to the effective-mass denominator for a
    /// step of `dt` seconds
    pub fn softness(&self, dt: f32) -> f32 {
        let d = self.contact_relaxation.max(1.0);
        let k = self.contact_stiffness.max(f32::EPSILON);
        4.0 / (dt * dt * k * (1.0 + 4.0 * d))
    }

    /// Friction and restitution as a [`PhysicsMaterial`]
    pub fn surface(&self) -> PhysicsMaterial {
        PhysicsMaterial {
            friction: self.friction,
            restitution: self.restitution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_contact_material() {
        assert_eq!(PhysicsMaterial::default(), ContactMaterial::default().surface());
    }

    #[test]
    fn test_coefficients_are_clamped() {
        let material = PhysicsMaterial::new(2.0, -1.0);
        assert_eq!(material, PhysicsMaterial::new(1.0, 0.0));
    }

    #[test]
    fn test_combined_surface() {
        let surface = PhysicsMaterial::SLICK.combine(&PhysicsMaterial::BOUNCY);
        assert!((surface.friction - (0.05_f32 * 0.6).sqrt()).abs() < 1e-6);
        assert_eq!(surface.restitution, 0.8);
        // Symmetric
        assert_eq!(surface, PhysicsMaterial::BOUNCY.combine(&PhysicsMaterial::SLICK));
    }

    #[test]
    fn test_default_contact_material() {
        let contact = ContactMaterial::default();
        assert_eq!(contact.friction, 0.98);
        assert_eq!(contact.restitution, 0.0);
        assert_eq!(contact.contact_stiffness, 1e8);
        assert_eq!(contact.contact_relaxation, 4.0);
    }

    #[test]
    fn test_stiff_contact_is_nearly_rigid() {
        let contact = ContactMaterial::default();
        assert_eq!(contact.baumgarte(), 0.25);
        assert!(contact.softness(1.0 / 60.0) < 1e-4);

        let soft = ContactMaterial { contact_stiffness: 1e4, ..contact };
        assert!(soft.softness(1.0 / 60.0) > contact.softness(1.0 / 60.0));
    }
}
