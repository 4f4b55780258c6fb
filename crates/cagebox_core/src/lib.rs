//! Core types for the cagebox sandbox
//!
//! This crate ties physics bodies to renderable transforms:
//!
//! - [`SceneGraph`] - Arena of transform nodes addressed by [`NodeKey`]
//! - [`RigidBodyWorld`] - The simulation plus its body/node pairs
//! - [`BodyBinding`] - Lifecycle of one body on behalf of one node
//! - [`CageCompoundBody`] - The static floor-and-walls collider
//! - [`Object3DInstance`] / [`ShapeKind`] - Spawned shapes and their factory
//! - [`Scene`] - Loadable/saveable instance store

mod binding;
mod cage;
mod geometry;
mod instance;
mod scene;
mod scene_graph;
mod shapes;
mod transform;
mod world;

pub use binding::{BodyBinding, BodyOptions, DEFAULT_MASS};
pub use cage::{CageCompoundBody, CageDimensions, CageSlab, SlabKind};
pub use geometry::GeometryDesc;
pub use instance::{InstanceId, Material, Object3DInstance, ShapeKind};
pub use scene::{Scene, SceneLoadError, SceneSaveError};
pub use scene_graph::{DirtyFlags, NodeKey, RayHit, SceneGraph, SceneNode};
pub use shapes::{ShapeDescriptor, CYLINDER_HEIGHT_FACTOR, CYLINDER_SEGMENTS};
pub use transform::Transform;
pub use world::{BodyPair, RigidBodyWorld, WorldError};

// Re-export commonly used types from cagebox_math for convenience
pub use cagebox_math::{Plane, Quat, Ray, Vec2, Vec3};

// Re-export physics types for convenient access through cagebox_core
pub use cagebox_physics::{BodyKey, BodyType, BroadphaseKind, ContactMaterial, PhysicsConfig, PhysicsWorld, RigidBody, Shape};
