//! Error types for rig construction and controller wiring

use thiserror::Error;

/// Errors raised while building a creature rig or wiring its controller.
///
/// Everything here is a construction-time failure. Once a creature exists,
/// actuation is total: out-of-range contractions saturate, a missing previous
/// timestamp means "first tick", neither is an error.
#[derive(Debug, Error)]
pub enum RigError {
    /// The overall size multiplier must be a positive, finite number.
    #[error("invalid rig scale {scale}: must be positive and finite")]
    InvalidScale { scale: f32 },

    /// The controller's input width does not match what the encoder produces.
    #[error("controller expects a state vector of length {expected}, encoder produces {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Two muscle anchor points coincide, so no rest length can be derived.
    #[error("degenerate muscle '{name}': anchor separation {separation} is below the minimum")]
    DegenerateMuscle { name: String, separation: f32 },
}
