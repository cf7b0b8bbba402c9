//! Proprioceptive state encoding
//!
//! Flattens the creature's own body state into the fixed-length numeric
//! vector the controller reads: every muscle contributes its contraction
//! set-point, and primary muscles additionally contribute the orientation
//! of the two bodies they connect.

use glam::Vec3;

use crate::muscle::MuscleInterface;
use crate::physics::PhysicsWorld;

/// Number of extra scalars a primary muscle contributes (relative Euler
/// angles plus both bodies' absolute Euler angles)
pub const PRIMARY_EXTRA: usize = 9;

/// Encoded state width for a given muscle set.
///
/// This is the controller's state input width; the two are checked against
/// each other at construction time.
pub fn body_state_len(muscles: &MuscleInterface) -> usize {
    muscles.len() + PRIMARY_EXTRA * muscles.primary_count()
}

/// Encode the current body state, in muscle-interface order.
///
/// For every muscle: its current contraction. For primary muscles,
/// additionally the difference of the two bodies' Euler decompositions, then
/// body A's Euler angles, then body B's. Bodies the dynamics engine no
/// longer knows about read as zero orientation rather than shifting the
/// vector layout: the output length is always [`body_state_len`].
pub fn body_state(muscles: &MuscleInterface, physics: &PhysicsWorld) -> Vec<f32> {
    let mut state = Vec::with_capacity(body_state_len(muscles));

    for muscle in muscles {
        state.push(muscle.current_contraction());

        if muscle.is_primary {
            let rot_a = physics.body_euler(muscle.body_a).unwrap_or(Vec3::ZERO);
            let rot_b = physics.body_euler(muscle.body_b).unwrap_or(Vec3::ZERO);
            let delta = rot_a - rot_b;

            state.extend_from_slice(&[
                delta.x, delta.y, delta.z, rot_a.x, rot_a.y, rot_a.z, rot_b.x, rot_b.y, rot_b.z,
            ]);
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::muscle::{Muscle, MuscleParams};
    use crate::skeleton::{BodySegment, SegmentLabel, ShapeKind, ShapeSpec};
    use glam::Quat;

    fn spawn_ball(world: &mut PhysicsWorld, position: Vec3) -> rapier3d::prelude::RigidBodyHandle {
        let segment = BodySegment {
            label: SegmentLabel::Pelvis,
            mass: 1.0,
            position,
            length: 1.0,
            shapes: vec![ShapeSpec {
                kind: ShapeKind::Sphere { radius: 0.5 },
                offset: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            }],
        };
        world.spawn_segment(&segment, Quat::IDENTITY, Vec3::ZERO)
    }

    fn pair(world: &mut PhysicsWorld) -> MuscleInterface {
        let a = spawn_ball(world, Vec3::ZERO);
        let b = spawn_ball(world, Vec3::new(2.0, 0.0, 0.0));

        let params = MuscleParams::default();
        let mut muscles = MuscleInterface::new();
        muscles.add_muscle(Muscle::new(
            a,
            b,
            true,
            Vec3::new(0.0, 0.2, 0.0),
            Vec3::new(0.0, 0.2, 0.0),
            2.0,
            &params,
        ));
        muscles.add_muscle(Muscle::new(
            a,
            b,
            false,
            Vec3::new(0.0, -0.2, 0.0),
            Vec3::new(0.0, -0.2, 0.0),
            2.0,
            &params,
        ));
        muscles
    }

    #[test]
    fn test_state_length_formula() {
        let mut world = PhysicsWorld::empty();
        let muscles = pair(&mut world);

        // 2 muscles, 1 primary: 2 + 9
        assert_eq!(body_state_len(&muscles), 11);
        assert_eq!(body_state(&muscles, &world).len(), 11);
    }

    #[test]
    fn test_contractions_lead_each_muscle_block() {
        let mut world = PhysicsWorld::empty();
        let mut muscles = pair(&mut world);
        muscles.set_contractions(&[0.7, 1.3]);

        let state = body_state(&muscles, &world);
        assert_eq!(state[0], 0.7);
        // Primary muscle contributes 9 orientation scalars before the next
        // muscle's contraction
        assert_eq!(state[10], 1.3);
    }

    #[test]
    fn test_identity_orientations_encode_as_zero() {
        let mut world = PhysicsWorld::empty();
        let muscles = pair(&mut world);

        let state = body_state(&muscles, &world);
        for value in &state[1..10] {
            assert_eq!(*value, 0.0);
        }
    }
}
