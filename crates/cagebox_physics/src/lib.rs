//! Rigid-body physics for the cagebox sandbox
//!
//! This crate provides a small impulse-based simulation, including:
//! - Collision shapes (spheres, cuboids, cylinder/cone polytopes, compounds)
//! - Contact generation with speculative margins
//! - A sequential-impulse contact solver with warm starting
//! - Fixed-rate stepping with a bounded number of catch-up substeps

pub mod body;
pub mod broadphase;
pub mod collision;
pub mod material;
pub mod shapes;
mod solver;
pub mod world;

// Re-export commonly used types
pub use body::{BodyKey, BodyType, RigidBody};
pub use broadphase::BroadphaseKind;
pub use collision::{CollisionFilter, CollisionLayer, Contact};
pub use material::{ContactMaterial, PhysicsMaterial};
pub use shapes::{Aabb, ColliderShape, ConvexHull, Face, Shape};
pub use world::{PhysicsConfig, PhysicsWorld};
