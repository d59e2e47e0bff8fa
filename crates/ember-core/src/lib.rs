//! Ember Core - Foundational types for the Ember particle engine
//!
//! This crate provides the core types the engine crates depend on:
//! - `EmitterId` - Stable emitter identifiers
//! - `Transform`, `Vec3`, `Quat` - Spatial types
//! - `Color` - RGBA color
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{EmberError, Result};
pub use id::EmitterId;
pub use types::{Color, Quat, Transform, Vec3};
