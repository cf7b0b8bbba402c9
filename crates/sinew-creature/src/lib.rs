//! Procedurally rigged, muscle-actuated creatures for Sinew
//!
//! This crate implements:
//! - Deterministic biped skeleton generation from a small parameter set
//! - Antagonistic spring-muscle actuation with clamped contraction set-points
//! - Proprioceptive state encoding plus periodic drive signals
//! - A fixed-weight feedforward controller mapping state to contractions
//! - The per-tick actuation loop over a rapier3d-backed dynamics facade

pub mod brain;
pub mod creature;
pub mod error;
pub mod muscle;
pub mod physics;
pub mod proprioception;
pub mod rig;
pub mod skeleton;
pub mod types;

// Re-export main types for convenience
pub use brain::{drive_signals, Brain, BrainConfig, OutputMode, DRIVE_DIM};
pub use creature::Creature;
pub use error::RigError;
pub use muscle::{Muscle, MuscleInterface, MuscleParams};
pub use physics::{PhysicsWorld, MAX_SUBSTEPS, NOMINAL_TIMESTEP};
pub use rig::{assemble_biped_muscles, RigProfile};
pub use skeleton::{RigConfig, SkeletonSpec};
pub use types::EntityId;
