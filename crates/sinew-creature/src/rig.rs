//! Muscle rig assembly
//!
//! Walks the biped's actuated degrees of freedom and emits a symmetric
//! front/back antagonistic muscle pair for each one, with anchor offsets
//! derived from the segment geometry. Hips and shoulders are actuated on
//! more than one axis, so the muscle count is twice the number of controlled
//! degrees of freedom, not twice the joint count.
//!
//! Pairs are appended to the [`MuscleInterface`] in a fixed, deterministic
//! order: that order is the controller's output contract.

use glam::Vec3;
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use crate::brain::OutputMode;
use crate::error::RigError;
use crate::muscle::{Muscle, MuscleInterface, MuscleParams};
use crate::skeleton::{SegmentLabel, SkeletonSpec};

/// Anchor separations below this fraction of the rig scale are considered
/// degenerate: no rest length can be derived from them.
const MIN_SEPARATION_PER_SCALE: f32 = 1.0e-4;

/// How a pair's baseline rest length is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestLengths {
    /// World-space distance between the two offset body centers at rest
    Geometric,
    /// Arithmetic mean of the two segments' lengths
    SegmentMean,
}

/// Rig/actuation profile.
///
/// The two profiles reflect two observed tunings of the same body plan; they
/// are alternative configurations, not a setting to interpolate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigProfile {
    pub rest_lengths: RestLengths,
    /// Back-muscle rest lengths are multiplied by this factor, so the
    /// antagonist pair does not sit at equal rest tension when below 1
    pub back_relax: f32,
    /// Whether feet get a second pair for the pitch degree of freedom
    pub ankle_pitch: bool,
    /// Output activation the controller should use with this rig
    pub output_mode: OutputMode,
}

impl RigProfile {
    /// Geometric rest lengths, no pre-tension, ankle pitch actuated,
    /// normalized controller outputs
    pub fn standard() -> Self {
        Self {
            rest_lengths: RestLengths::Geometric,
            back_relax: 1.0,
            ankle_pitch: true,
            output_mode: OutputMode::Normalized,
        }
    }

    /// Segment-mean rest lengths with the back muscle pre-tensioned to 90%,
    /// no ankle pitch, direct controller outputs
    pub fn pretensioned() -> Self {
        Self {
            rest_lengths: RestLengths::SegmentMean,
            back_relax: 0.9,
            ankle_pitch: false,
            output_mode: OutputMode::Direct,
        }
    }
}

impl Default for RigProfile {
    fn default() -> Self {
        Self::standard()
    }
}

struct PairAssembler<'a> {
    skeleton: &'a SkeletonSpec,
    bodies: &'a [RigidBodyHandle],
    params: &'a MuscleParams,
    profile: &'a RigProfile,
    muscles: MuscleInterface,
}

impl PairAssembler<'_> {
    /// Emit one antagonistic pair between two segments.
    ///
    /// `offset` is the pair's lever arm in each body's local frame: the front
    /// muscle anchors at `extra + offset`, the back muscle at
    /// `extra - offset`. Extra offsets shift the whole pair on wide segments
    /// (a hip pair attaches at the pelvis's side, not its center).
    fn pair(
        &mut self,
        name: &str,
        label_a: SegmentLabel,
        label_b: SegmentLabel,
        offset: Vec3,
        extra_a: Vec3,
        extra_b: Vec3,
    ) -> Result<(), RigError> {
        let index_a = self.skeleton.index_of(label_a);
        let index_b = self.skeleton.index_of(label_b);
        let seg_a = &self.skeleton.segments[index_a];
        let seg_b = &self.skeleton.segments[index_b];

        let rest_length = match self.profile.rest_lengths {
            RestLengths::Geometric => {
                let separation =
                    ((seg_a.position + extra_a) - (seg_b.position + extra_b)).length();
                if separation < MIN_SEPARATION_PER_SCALE * self.skeleton.dims.scale {
                    return Err(RigError::DegenerateMuscle {
                        name: name.to_string(),
                        separation,
                    });
                }
                separation
            }
            RestLengths::SegmentMean => (seg_a.length + seg_b.length) / 2.0,
        };

        let body_a = self.bodies[index_a];
        let body_b = self.bodies[index_b];

        self.muscles.add_muscle(Muscle::new(
            body_a,
            body_b,
            true,
            extra_a + offset,
            extra_b + offset,
            rest_length,
            self.params,
        ));
        self.muscles.add_muscle(Muscle::new(
            body_a,
            body_b,
            false,
            extra_a - offset,
            extra_b - offset,
            rest_length * self.profile.back_relax,
            self.params,
        ));

        Ok(())
    }
}

/// Assemble the biped's full muscle set over already-spawned bodies.
///
/// `bodies` must be the skeleton's segments in their declared order, as returned by
/// spawning them one by one. Rest lengths are derived from the skeleton's
/// rest pose, so assembly is pure arithmetic and deterministic: rebuilding
/// the same skeleton yields the same muscles in the same order.
pub fn assemble_biped_muscles(
    skeleton: &SkeletonSpec,
    bodies: &[RigidBodyHandle],
    params: &MuscleParams,
    profile: &RigProfile,
) -> Result<MuscleInterface, RigError> {
    assert_eq!(
        bodies.len(),
        skeleton.segments.len(),
        "one spawned body per skeleton segment"
    );

    let d = skeleton.dims;
    let leg = d.lower_leg_size;
    let arm = d.upper_arm_size;
    let hip = d.shoulders_distance / 2.0;

    let mut assembler = PairAssembler {
        skeleton,
        bodies,
        params,
        profile,
        muscles: MuscleInterface::new(),
    };

    use SegmentLabel::*;

    // Knees (flex/extend)
    assembler.pair(
        "knee_left",
        UpperLegLeft,
        LowerLegLeft,
        Vec3::new(0.0, leg, 0.0),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;
    assembler.pair(
        "knee_right",
        UpperLegRight,
        LowerLegRight,
        Vec3::new(0.0, leg, 0.0),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;

    // Ankles, up/down
    assembler.pair(
        "ankle_left",
        LowerLegLeft,
        FootLeft,
        Vec3::new(0.0, leg, 0.0),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;
    assembler.pair(
        "ankle_right",
        LowerLegRight,
        FootRight,
        Vec3::new(0.0, leg, 0.0),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;

    // Ankles, pitch
    if profile.ankle_pitch {
        assembler.pair(
            "ankle_pitch_left",
            LowerLegLeft,
            FootLeft,
            Vec3::new(leg / 2.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
        )?;
        assembler.pair(
            "ankle_pitch_right",
            LowerLegRight,
            FootRight,
            Vec3::new(leg / 2.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
        )?;
    }

    // Hips, flex/extend (quads and hamstrings)
    assembler.pair(
        "hip_left",
        Pelvis,
        UpperLegLeft,
        Vec3::new(0.0, leg, 0.0),
        Vec3::new(hip, 0.0, 0.0),
        Vec3::ZERO,
    )?;
    assembler.pair(
        "hip_right",
        Pelvis,
        UpperLegRight,
        Vec3::new(0.0, leg, 0.0),
        Vec3::new(-hip, 0.0, 0.0),
        Vec3::ZERO,
    )?;

    // Hips, spread/close
    assembler.pair(
        "hip_spread_left",
        Pelvis,
        UpperLegLeft,
        Vec3::new(leg, 0.0, 0.0),
        Vec3::new(hip, 0.0, 0.0),
        Vec3::ZERO,
    )?;
    assembler.pair(
        "hip_spread_right",
        Pelvis,
        UpperLegRight,
        Vec3::new(-leg, 0.0, 0.0),
        Vec3::new(-hip, 0.0, 0.0),
        Vec3::ZERO,
    )?;

    // Torso, abs / lower back
    assembler.pair(
        "torso",
        UpperBody,
        Pelvis,
        Vec3::new(0.0, leg, 0.0),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;
    // Torso, sides
    assembler.pair(
        "torso_side",
        UpperBody,
        Pelvis,
        Vec3::new(hip, 0.0, 0.0),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;

    // Elbows (biceps / triceps)
    assembler.pair(
        "elbow_left",
        UpperArmLeft,
        LowerArmLeft,
        Vec3::new(0.0, 0.0, arm),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;
    assembler.pair(
        "elbow_right",
        UpperArmRight,
        LowerArmRight,
        Vec3::new(0.0, 0.0, arm),
        Vec3::ZERO,
        Vec3::ZERO,
    )?;

    // Shoulders, front/back
    let shoulder_anchor = Vec3::new(0.0, 0.0, d.upper_body_length / 2.0 - arm);
    assembler.pair(
        "shoulder_left",
        UpperBody,
        UpperArmLeft,
        Vec3::new(0.0, arm, 0.0),
        shoulder_anchor,
        Vec3::ZERO,
    )?;
    assembler.pair(
        "shoulder_right",
        UpperBody,
        UpperArmRight,
        Vec3::new(0.0, arm, 0.0),
        shoulder_anchor,
        Vec3::ZERO,
    )?;

    // Shoulders, up/down
    let shoulder_top = Vec3::new(0.0, 0.0, d.upper_body_length / 2.0 + arm / 2.0);
    assembler.pair(
        "shoulder_lift_left",
        UpperBody,
        UpperArmLeft,
        Vec3::new(0.0, 0.0, arm),
        shoulder_top,
        Vec3::ZERO,
    )?;
    assembler.pair(
        "shoulder_lift_right",
        UpperBody,
        UpperArmRight,
        Vec3::new(0.0, 0.0, arm),
        shoulder_top,
        Vec3::ZERO,
    )?;

    let muscles = assembler.muscles;
    log::debug!(
        "Rig: assembled {} muscles ({} primary)",
        muscles.len(),
        muscles.primary_count()
    );

    Ok(muscles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::RigConfig;

    fn placeholder_bodies(skeleton: &SkeletonSpec) -> Vec<RigidBodyHandle> {
        // Assembly derives rest lengths from the skeleton's rest pose, so no
        // physics world is needed to exercise it
        vec![RigidBodyHandle::invalid(); skeleton.segments.len()]
    }

    #[test]
    fn test_standard_profile_muscle_count() {
        let skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let bodies = placeholder_bodies(&skeleton);
        let muscles = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::standard(),
        )
        .unwrap();

        // 18 controlled degrees of freedom, one antagonistic pair each
        assert_eq!(muscles.len(), 36);
        assert_eq!(muscles.primary_count(), 18);
    }

    #[test]
    fn test_pretensioned_profile_drops_ankle_pitch() {
        let skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let bodies = placeholder_bodies(&skeleton);
        let muscles = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::pretensioned(),
        )
        .unwrap();

        assert_eq!(muscles.len(), 32);
        assert_eq!(muscles.primary_count(), 16);
    }

    #[test]
    fn test_pairs_alternate_front_back() {
        let skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let bodies = placeholder_bodies(&skeleton);
        let muscles = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::standard(),
        )
        .unwrap();

        for (index, muscle) in muscles.iter().enumerate() {
            assert_eq!(muscle.is_primary, index % 2 == 0);
        }
    }

    #[test]
    fn test_pair_members_mirror_anchors() {
        let skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let bodies = placeholder_bodies(&skeleton);
        let muscles = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::standard(),
        )
        .unwrap();

        // First pair is the left knee with a pure lever-arm offset: front and
        // back anchors are exact mirrors
        let front = muscles.get(0).unwrap();
        let back = muscles.get(1).unwrap();
        assert_eq!(front.local_anchor_a, -back.local_anchor_a);
        assert_eq!(front.local_anchor_b, -back.local_anchor_b);
        assert_eq!(front.body_a, back.body_a);
        assert_eq!(front.body_b, back.body_b);
    }

    #[test]
    fn test_rebuild_yields_identical_order() {
        let config = RigConfig::default();
        let build = || {
            let skeleton = SkeletonSpec::biped(&config).unwrap();
            let bodies = placeholder_bodies(&skeleton);
            assemble_biped_muscles(
                &skeleton,
                &bodies,
                &MuscleParams::default(),
                &RigProfile::standard(),
            )
            .unwrap()
        };

        let a = build();
        let b = build();
        assert_eq!(a.len(), b.len());
        for (ma, mb) in a.iter().zip(b.iter()) {
            assert_eq!(ma.local_anchor_a, mb.local_anchor_a);
            assert_eq!(ma.local_anchor_b, mb.local_anchor_b);
            assert_eq!(ma.normal_rest_length(), mb.normal_rest_length());
            assert_eq!(ma.is_primary, mb.is_primary);
        }
    }

    #[test]
    fn test_pretension_relaxes_back_muscles() {
        let skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let bodies = placeholder_bodies(&skeleton);
        let muscles = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::pretensioned(),
        )
        .unwrap();

        for pair in muscles.iter().collect::<Vec<_>>().chunks(2) {
            let (front, back) = (pair[0], pair[1]);
            approx::assert_relative_eq!(
                back.normal_rest_length(),
                front.normal_rest_length() * 0.9,
                epsilon = 1.0e-6
            );
        }
    }

    #[test]
    fn test_geometric_rest_lengths_are_positive() {
        let skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let bodies = placeholder_bodies(&skeleton);
        let muscles = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::standard(),
        )
        .unwrap();

        for muscle in &muscles {
            assert!(muscle.normal_rest_length() > 0.0);
        }
    }

    #[test]
    fn test_coincident_segments_are_rejected() {
        let mut skeleton = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        for segment in &mut skeleton.segments {
            segment.position = glam::Vec3::ZERO;
        }
        let bodies = placeholder_bodies(&skeleton);

        let result = assemble_biped_muscles(
            &skeleton,
            &bodies,
            &MuscleParams::default(),
            &RigProfile::standard(),
        );
        assert!(matches!(result, Err(RigError::DegenerateMuscle { .. })));
    }
}
