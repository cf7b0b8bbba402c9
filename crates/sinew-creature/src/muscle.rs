//! Antagonistic spring actuators
//!
//! A muscle is one half of an antagonistic pair: a spring between two bodies
//! with a baseline rest length and a clamped contraction set-point. The
//! dynamics engine realizes the force; the muscle only holds the set-point
//! and the rest length derived from it.

use glam::Vec3;
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

/// Default lower bound of the contraction range
pub const MIN_CONTRACTION: f32 = 0.0;
/// Default upper bound of the contraction range
pub const MAX_CONTRACTION: f32 = 2.0;

/// Spring stiffness/damping shared by a muscle group
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MuscleParams {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for MuscleParams {
    fn default() -> Self {
        Self {
            stiffness: 50.0,
            damping: 5.0,
        }
    }
}

/// A single spring actuator between two bodies.
///
/// Body handles are relations into the dynamics engine, never ownership.
/// `normal_rest_length` is fixed at creation; the externally visible
/// `rest_length` is always `normal_rest_length * current_contraction`.
#[derive(Debug, Clone)]
pub struct Muscle {
    pub body_a: RigidBodyHandle,
    pub body_b: RigidBodyHandle,
    pub local_anchor_a: Vec3,
    pub local_anchor_b: Vec3,
    pub stiffness: f32,
    pub damping: f32,
    /// Whether this muscle's body orientations feed the state encoder.
    /// Only the front member of each antagonistic pair is primary, so the
    /// encoder does not duplicate angles for the back member.
    pub is_primary: bool,
    normal_rest_length: f32,
    rest_length: f32,
    current_contraction: f32,
    min_contraction: f32,
    max_contraction: f32,
}

impl Muscle {
    pub fn new(
        body_a: RigidBodyHandle,
        body_b: RigidBodyHandle,
        is_primary: bool,
        local_anchor_a: Vec3,
        local_anchor_b: Vec3,
        rest_length: f32,
        params: &MuscleParams,
    ) -> Self {
        Self {
            body_a,
            body_b,
            local_anchor_a,
            local_anchor_b,
            stiffness: params.stiffness,
            damping: params.damping,
            is_primary,
            normal_rest_length: rest_length,
            rest_length,
            current_contraction: 1.0,
            min_contraction: MIN_CONTRACTION,
            max_contraction: MAX_CONTRACTION,
        }
    }

    /// Set the contraction set-point.
    ///
    /// The factor is clamped into the muscle's contraction range; the stored
    /// contraction is the clamped value and the spring rest length becomes
    /// `normal_rest_length * clamped`. This is the only mutator and it is
    /// idempotent.
    pub fn set_contraction(&mut self, factor: f32) {
        let constrained = factor.clamp(self.min_contraction, self.max_contraction);
        self.current_contraction = constrained;
        self.rest_length = self.normal_rest_length * constrained;
    }

    /// Current contraction set-point (always within the clamp range)
    pub fn current_contraction(&self) -> f32 {
        self.current_contraction
    }

    /// Rest length the dynamics engine's spring should use this tick
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Baseline rest length captured from the initial geometry
    pub fn normal_rest_length(&self) -> f32 {
        self.normal_rest_length
    }

    /// Contraction clamp range as (min, max)
    pub fn contraction_range(&self) -> (f32, f32) {
        (self.min_contraction, self.max_contraction)
    }
}

/// Ordered muscle sequence: the controller's output contract.
///
/// Index i of the controller output always maps to muscle i. The sequence is
/// append-only during rig assembly and never reordered afterward, because the
/// controller's output layer width and order are fixed at construction from
/// this sequence's length.
#[derive(Debug, Default)]
pub struct MuscleInterface {
    muscles: Vec<Muscle>,
}

impl MuscleInterface {
    pub fn new() -> Self {
        Self {
            muscles: Vec::new(),
        }
    }

    /// Append a muscle. Assembly-time only; the position it lands at is its
    /// controller output index for the lifetime of the creature.
    pub fn add_muscle(&mut self, muscle: Muscle) {
        self.muscles.push(muscle);
    }

    pub fn len(&self) -> usize {
        self.muscles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.muscles.is_empty()
    }

    /// Number of primary muscles (those feeding orientation state)
    pub fn primary_count(&self) -> usize {
        self.muscles.iter().filter(|m| m.is_primary).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Muscle> {
        self.muscles.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Muscle> {
        self.muscles.get(index)
    }

    /// Write one contraction set-point per muscle, in interface order.
    ///
    /// `contractions` must be exactly one value per muscle.
    pub fn set_contractions(&mut self, contractions: &[f32]) {
        assert_eq!(
            contractions.len(),
            self.muscles.len(),
            "one contraction per muscle"
        );
        for (muscle, &factor) in self.muscles.iter_mut().zip(contractions) {
            muscle.set_contraction(factor);
        }
    }

    /// Set a single muscle's contraction (debug/presentation hook)
    pub fn set_contraction(&mut self, index: usize, factor: f32) {
        self.muscles[index].set_contraction(factor);
    }
}

impl<'a> IntoIterator for &'a MuscleInterface {
    type Item = &'a Muscle;
    type IntoIter = std::slice::Iter<'a, Muscle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_muscle(rest_length: f32) -> Muscle {
        Muscle::new(
            RigidBodyHandle::invalid(),
            RigidBodyHandle::invalid(),
            true,
            Vec3::ZERO,
            Vec3::ZERO,
            rest_length,
            &MuscleParams::default(),
        )
    }

    #[test]
    fn test_contraction_scales_rest_length_exactly() {
        let mut muscle = test_muscle(2.0);
        muscle.set_contraction(0.5);
        assert_eq!(muscle.current_contraction(), 0.5);
        assert_eq!(muscle.rest_length(), 1.0);
        assert_eq!(muscle.normal_rest_length(), 2.0);
    }

    #[test]
    fn test_contraction_clamps_above_max() {
        let mut muscle = test_muscle(1.0);
        muscle.set_contraction(3.0);
        assert_eq!(muscle.current_contraction(), 2.0);
        assert_eq!(muscle.rest_length(), 2.0);
    }

    #[test]
    fn test_contraction_clamps_below_min() {
        let mut muscle = test_muscle(1.0);
        muscle.set_contraction(-1.0);
        assert_eq!(muscle.current_contraction(), 0.0);
        assert_eq!(muscle.rest_length(), 0.0);
    }

    #[test]
    fn test_contraction_is_idempotent() {
        let mut once = test_muscle(1.5);
        once.set_contraction(0.8);

        let mut twice = test_muscle(1.5);
        twice.set_contraction(0.8);
        twice.set_contraction(0.8);

        assert_eq!(once.current_contraction(), twice.current_contraction());
        assert_eq!(once.rest_length(), twice.rest_length());
    }

    #[test]
    fn test_normal_rest_length_never_mutates() {
        let mut muscle = test_muscle(1.5);
        for factor in [0.0, 0.5, 1.0, 2.0, 5.0, -3.0] {
            muscle.set_contraction(factor);
            assert_eq!(muscle.normal_rest_length(), 1.5);
        }
    }

    #[test]
    fn test_interface_preserves_insertion_order() {
        let mut interface = MuscleInterface::new();
        for rest in [1.0, 2.0, 3.0] {
            interface.add_muscle(test_muscle(rest));
        }
        let rests: Vec<f32> = interface.iter().map(|m| m.normal_rest_length()).collect();
        assert_eq!(rests, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_set_contractions_applies_in_order() {
        let mut interface = MuscleInterface::new();
        for _ in 0..3 {
            interface.add_muscle(test_muscle(1.0));
        }
        interface.set_contractions(&[0.1, 0.2, 0.3]);
        let stored: Vec<f32> = interface.iter().map(|m| m.current_contraction()).collect();
        assert_eq!(stored, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    #[should_panic(expected = "one contraction per muscle")]
    fn test_set_contractions_rejects_wrong_length() {
        let mut interface = MuscleInterface::new();
        interface.add_muscle(test_muscle(1.0));
        interface.set_contractions(&[0.5, 0.5]);
    }
}
