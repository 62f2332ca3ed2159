//! Error types for the ferrofluid core.

use thiserror::Error;

/// Errors produced by field construction, extraction, and the physics world.
#[derive(Debug, Error)]
pub enum FerroError {
    /// The sampling grid resolution was too small to hold an interior cell.
    #[error("invalid resolution {0}: the sampling grid needs at least 3 points per axis")]
    InvalidResolution(usize),

    /// A configuration value was outside its usable range.
    #[error("invalid configuration for '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// A preset name was not recognized.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// A body handle did not refer to a body of the physics world.
    #[error("unknown body handle {0}")]
    UnknownBody(usize),

    /// A collider handle did not refer to a collider of the physics world.
    #[error("unknown collider handle {0}")]
    UnknownCollider(usize),

    /// A position was written to a body that is driven by forces.
    #[error("body {0} is dynamic; only kinematic bodies accept positions")]
    NotKinematic(usize),

    /// The physics world could not be constructed.
    #[error("physics world failed to initialize: {0}")]
    PhysicsInit(String),

    /// A field contributor carried a NaN or infinite coordinate or strength.
    #[error("non-finite field contribution from {source_name}")]
    NonFiniteContribution { source_name: String },

    /// A grid or sample buffer did not have the expected size.
    #[error("dimension mismatch: {lhs} vs {rhs}")]
    DimensionMismatch { lhs: usize, rhs: usize },

    /// An I/O failure while exporting frame data.
    #[error("I/O error: {0}")]
    Io(String),
}
