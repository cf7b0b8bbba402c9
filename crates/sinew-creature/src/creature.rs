//! Main creature entity
//!
//! Combines skeleton, muscles, and controller, and drives the closed
//! actuation loop: encode body state, compute drive signals, infer one
//! contraction per muscle, write set-points, step the dynamics engine.

use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rapier3d::prelude::{ImpulseJointHandle, RigidBodyHandle};
use std::f32::consts::FRAC_PI_2;

use crate::brain::{drive_signals, Brain, BrainConfig};
use crate::error::RigError;
use crate::muscle::{MuscleInterface, MuscleParams};
use crate::physics::{PhysicsWorld, MAX_SUBSTEPS};
use crate::proprioception::{body_state, body_state_len};
use crate::rig::{assemble_biped_muscles, RigProfile};
use crate::skeleton::{RigConfig, SkeletonSpec};
use crate::types::EntityId;

/// A spawned, controllable creature.
///
/// Owns its skeleton spec, muscle interface, and controller exclusively; one
/// instance per creature, nothing shared between creatures. All state
/// mutation happens on the thread driving [`Creature::update`].
pub struct Creature {
    pub id: EntityId,
    pub skeleton: SkeletonSpec,
    pub bodies: Vec<RigidBodyHandle>,
    pub joints: Vec<ImpulseJointHandle>,
    pub muscles: MuscleInterface,
    pub brain: Brain,

    /// Wall-clock timestamp of the previous tick, if any
    last_tick: Option<f64>,
    /// Simulated seconds accumulated so far; the drive signals' clock
    sim_time: f32,
    max_substeps: usize,
}

impl Creature {
    /// Build and spawn a biped creature into the physics world.
    ///
    /// The skeleton's z-up rest pose is rotated upright into the y-up world
    /// and shifted to `spawn_position`. The controller is sized from the
    /// assembled muscle interface and seeded with `seed`, so two creatures
    /// spawned with the same configuration and seed behave identically.
    pub fn spawn(
        physics: &mut PhysicsWorld,
        config: &RigConfig,
        profile: &RigProfile,
        muscle_params: &MuscleParams,
        brain_config: &BrainConfig,
        seed: u64,
        spawn_position: Vec3,
    ) -> Result<Self, RigError> {
        let skeleton = SkeletonSpec::biped(config)?;

        let spawn_rotation = Quat::from_rotation_x(-FRAC_PI_2);
        let bodies: Vec<RigidBodyHandle> = skeleton
            .segments
            .iter()
            .map(|segment| physics.spawn_segment(segment, spawn_rotation, spawn_position))
            .collect();

        let joints: Vec<ImpulseJointHandle> = skeleton
            .joints
            .iter()
            .map(|joint| physics.create_joint(&bodies, joint))
            .collect();

        let muscles = assemble_biped_muscles(&skeleton, &bodies, muscle_params, profile)?;

        let state_dim = body_state_len(&muscles);
        let brain_config = BrainConfig {
            output_mode: profile.output_mode,
            ..brain_config.clone()
        };
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let brain = Brain::new(state_dim, muscles.len(), &brain_config, &mut rng);
        brain.check_state_dim(state_dim)?;

        let id = EntityId::new();
        log::info!(
            "Spawned {} at ({:.1}, {:.1}, {:.1}): {} bodies, {} joints, {} muscles, controller {}->{}",
            id,
            spawn_position.x,
            spawn_position.y,
            spawn_position.z,
            bodies.len(),
            joints.len(),
            muscles.len(),
            brain.input_dim(),
            brain.output_dim(),
        );

        Ok(Self {
            id,
            skeleton,
            bodies,
            joints,
            muscles,
            brain,
            last_tick: None,
            sim_time: 0.0,
            max_substeps: MAX_SUBSTEPS,
        })
    }

    /// Run one tick of the actuation loop.
    ///
    /// Control is computed from the pose left by the previous step, then the
    /// dynamics engine advances with the freshly written set-points
    /// (compute-then-step: feedback is delayed by exactly one tick). `now`
    /// is a wall-clock timestamp in seconds. On the first tick, with no
    /// previous timestamp to difference against, exactly one nominal step is
    /// taken. Returns the number of physics sub-steps performed.
    pub fn update(&mut self, physics: &mut PhysicsWorld, now: f64) -> usize {
        let mut input = body_state(&self.muscles, physics);
        input.extend_from_slice(&drive_signals(self.sim_time));

        let contractions = self.brain.infer(&input);
        self.muscles.set_contractions(&contractions);

        let substeps = match self.last_tick {
            // No previous timestamp: cannot guess elapsed time, take a
            // single nominal step
            None => {
                physics.step(&self.muscles);
                1
            }
            Some(previous) => {
                let elapsed = now - previous;
                physics.step_with_elapsed(&self.muscles, elapsed, self.max_substeps)
            }
        };

        self.sim_time += substeps as f32 * physics.timestep();
        self.last_tick = Some(now);

        log::trace!(
            "{}: tick at {:.3}s, {} sub-steps, sim time {:.3}s",
            self.id,
            now,
            substeps,
            self.sim_time
        );

        substeps
    }

    /// Simulated seconds accumulated across all ticks
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// World position of a segment by index into the skeleton's order
    pub fn body_position(&self, physics: &PhysicsWorld, index: usize) -> Option<Vec3> {
        self.bodies
            .get(index)
            .and_then(|&handle| physics.body_position(handle))
    }

    /// Remove the creature's bodies (and with them its joints and the
    /// springs' attachment points) from the physics world
    pub fn despawn(self, physics: &mut PhysicsWorld) {
        for handle in &self.bodies {
            physics.remove_body(*handle);
        }
        log::info!("Despawned {}", self.id);
    }
}
