//! Render data extraction
//!
//! Flattens a creature's physics state into plain data a presentation layer
//! can draw without touching the dynamics engine: one entry per body in
//! skeleton order, one entry per muscle in interface order.

use glam::{Quat, Vec3};

use sinew_creature::skeleton::ShapeSpec;
use sinew_creature::{Creature, PhysicsWorld};

/// Pose and shapes for a single body
#[derive(Debug, Clone)]
pub struct BodyRenderData {
    pub position: Vec3,
    pub rotation: Quat,
    pub shapes: Vec<ShapeSpec>,
}

/// One muscle's world-space span and activation
#[derive(Debug, Clone)]
pub struct MuscleRenderData {
    pub anchor_a: Vec3,
    pub anchor_b: Vec3,
    pub contraction: f32,
}

impl MuscleRenderData {
    /// Map contraction onto an RGB color: relaxed muscles render red,
    /// contracted ones blue.
    pub fn color(&self) -> [f32; 3] {
        let t = (self.contraction * 0.5).clamp(0.0, 1.0);
        [1.0 - t, 0.0, t]
    }
}

/// Render data for an entire creature
#[derive(Debug, Clone)]
pub struct CreatureRenderData {
    pub bodies: Vec<BodyRenderData>,
    pub muscles: Vec<MuscleRenderData>,
}

/// Extract render data for a creature.
///
/// Body order matches the skeleton's segment order and muscle order matches
/// the interface order, so a host can keep stable visual objects across
/// frames and only update poses.
pub fn extract_render_data(creature: &Creature, physics: &PhysicsWorld) -> CreatureRenderData {
    let bodies = creature
        .bodies
        .iter()
        .zip(&creature.skeleton.segments)
        .map(|(&handle, segment)| BodyRenderData {
            position: physics.body_position(handle).unwrap_or(Vec3::ZERO),
            rotation: physics.body_rotation(handle).unwrap_or(Quat::IDENTITY),
            shapes: segment.shapes.clone(),
        })
        .collect();

    let muscles = creature
        .muscles
        .iter()
        .map(|muscle| MuscleRenderData {
            anchor_a: physics
                .world_anchor(muscle.body_a, muscle.local_anchor_a)
                .unwrap_or(Vec3::ZERO),
            anchor_b: physics
                .world_anchor(muscle.body_b, muscle.local_anchor_b)
                .unwrap_or(Vec3::ZERO),
            contraction: muscle.current_contraction(),
        })
        .collect();

    CreatureRenderData { bodies, muscles }
}
