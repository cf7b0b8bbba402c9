//! Headless simulation runner
//!
//! Drives a creature at the nominal fixed timestep without any window or
//! renderer, reporting a small summary per simulated second. Useful for
//! smoke-testing rigs and controller seeds from the command line.

use anyhow::Result;
use glam::Vec3;

use sinew_creature::skeleton::SegmentLabel;
use sinew_creature::{
    BrainConfig, Creature, MuscleParams, PhysicsWorld, RigConfig, RigProfile, NOMINAL_TIMESTEP,
};

use crate::render::extract_render_data;

/// Headless run parameters
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub seconds: f32,
    pub seed: u64,
    pub rig: RigConfig,
    pub profile: RigProfile,
    pub gravity: Vec3,
    pub spawn_position: Vec3,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            seconds: 10.0,
            seed: 42,
            rig: RigConfig::default(),
            profile: RigProfile::standard(),
            gravity: Vec3::new(0.0, -9.81, 0.0),
            spawn_position: Vec3::new(0.0, 3.0, 0.0),
        }
    }
}

/// Owns one creature plus its world for a fixed-duration run
pub struct HeadlessRunner {
    physics: PhysicsWorld,
    creature: Creature,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    pub fn new(config: HeadlessConfig) -> Result<Self> {
        let mut physics = PhysicsWorld::new();
        physics.set_gravity(config.gravity);

        let creature = Creature::spawn(
            &mut physics,
            &config.rig,
            &config.profile,
            &MuscleParams::default(),
            &BrainConfig::default(),
            config.seed,
            config.spawn_position,
        )?;

        Ok(Self {
            physics,
            creature,
            config,
        })
    }

    /// Run to completion, logging a summary each simulated second.
    ///
    /// Ticks use synthetic timestamps spaced one nominal timestep apart, so
    /// headless runs are deterministic for a given seed.
    pub fn run(&mut self) -> Result<()> {
        let dt = NOMINAL_TIMESTEP as f64;
        let ticks = (self.config.seconds / NOMINAL_TIMESTEP).ceil() as usize;
        let head_index = self.creature.skeleton.index_of(SegmentLabel::Head);

        log::info!(
            "Headless run: {} ticks ({:.1}s simulated), seed {}",
            ticks,
            self.config.seconds,
            self.config.seed
        );

        for tick in 0..ticks {
            self.creature.update(&mut self.physics, tick as f64 * dt);

            if tick % 60 == 59 {
                let head = self
                    .creature
                    .body_position(&self.physics, head_index)
                    .unwrap_or(Vec3::ZERO);
                let mean_contraction: f32 = self
                    .creature
                    .muscles
                    .iter()
                    .map(|m| m.current_contraction())
                    .sum::<f32>()
                    / self.creature.muscles.len() as f32;

                log::info!(
                    "t={:>5.1}s head=({:+.2}, {:+.2}, {:+.2}) mean contraction {:.3}",
                    self.creature.sim_time(),
                    head.x,
                    head.y,
                    head.z,
                    mean_contraction
                );
            }
        }

        let data = extract_render_data(&self.creature, &self.physics);
        let head = &data.bodies[head_index];
        log::info!(
            "Run complete: head ended at ({:+.2}, {:+.2}, {:+.2}), {} muscles live",
            head.position.x,
            head.position.y,
            head.position.z,
            data.muscles.len()
        );

        Ok(())
    }

    pub fn creature(&self) -> &Creature {
        &self.creature
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_run_completes() {
        let config = HeadlessConfig {
            seconds: 0.5,
            ..HeadlessConfig::default()
        };
        let mut runner = HeadlessRunner::new(config).unwrap();
        runner.run().unwrap();

        assert!(runner.creature().sim_time() >= 0.5);
    }
}
