//! Sandbox assembly
//!
//! Provides the running [`Sandbox`] and a builder for constructing one.

mod sandbox;
mod scene_builder;

pub use sandbox::Sandbox;
pub use scene_builder::SandboxBuilder;
