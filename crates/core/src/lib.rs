#![deny(unsafe_code)]
//! Core types for the ferrofluid field simulation.
//!
//! Provides the per-frame `Engine` trait and `FrameContext`, the 3D
//! `ScalarField` metaball grid, cube-marching iso-surface extraction into an
//! `IsoSurface` mesh, the `Xorshift64` PRNG, JSON parameter helpers, and the
//! shared `FerroError` type.

pub mod engine;
pub mod error;
pub mod extract;
pub mod field;
pub mod mesh;
pub mod params;
pub mod prng;

pub use engine::{Engine, FrameContext};
pub use error::FerroError;
pub use extract::{extract, IsoSurfaceExtractor};
pub use field::ScalarField;
pub use mesh::IsoSurface;
pub use prng::Xorshift64;

pub use glam::{DQuat, DVec3};
