//! Biped skeleton generation
//!
//! Computes body placements and joint specifications for a fixed 13-segment
//! biped from a small parameter set. Placement is a bottom-up arithmetic
//! chain over segment half-lengths: no physics solve is needed to produce
//! the rest pose.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::error::RigError;

/// Configuration surface consumed by rig construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigConfig {
    /// Overall size multiplier
    pub scale: f32,
    /// Default joint swing limit in radians
    pub bend_angle: f32,
    /// Shoulder swing limit in radians (capped at PI by the builder)
    pub shoulder_angle: f32,
    /// Default joint twist limit in radians
    pub twist_angle: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            scale: 3.0,
            bend_angle: PI / 2.0,
            shoulder_angle: PI * 2.0,
            twist_angle: PI / 8.0,
        }
    }
}

/// Role of a segment within the biped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentLabel {
    LowerLegLeft,
    LowerLegRight,
    UpperLegLeft,
    UpperLegRight,
    FootLeft,
    FootRight,
    Pelvis,
    UpperBody,
    Head,
    UpperArmLeft,
    UpperArmRight,
    LowerArmLeft,
    LowerArmRight,
}

impl SegmentLabel {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SegmentLabel::LowerLegLeft => "lower_leg_left",
            SegmentLabel::LowerLegRight => "lower_leg_right",
            SegmentLabel::UpperLegLeft => "upper_leg_left",
            SegmentLabel::UpperLegRight => "upper_leg_right",
            SegmentLabel::FootLeft => "foot_left",
            SegmentLabel::FootRight => "foot_right",
            SegmentLabel::Pelvis => "pelvis",
            SegmentLabel::UpperBody => "upper_body",
            SegmentLabel::Head => "head",
            SegmentLabel::UpperArmLeft => "upper_arm_left",
            SegmentLabel::UpperArmRight => "upper_arm_right",
            SegmentLabel::LowerArmLeft => "lower_arm_left",
            SegmentLabel::LowerArmRight => "lower_arm_right",
        }
    }
}

/// Role of a joint within the biped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointLabel {
    Neck,
    KneeLeft,
    KneeRight,
    AnkleLeft,
    AnkleRight,
    HipLeft,
    HipRight,
    Spine,
    ShoulderLeft,
    ShoulderRight,
    ElbowLeft,
    ElbowRight,
}

/// Collision shape primitive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    /// Cylinder with its axis along local y
    Cylinder { half_height: f32, radius: f32 },
}

/// Shape attached to a segment, placed in the segment's local frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeSpec {
    pub kind: ShapeKind,
    pub offset: Vec3,
    pub rotation: Quat,
}

impl ShapeSpec {
    fn centered(kind: ShapeKind) -> Self {
        Self {
            kind,
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Body placement spec (physics-independent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySegment {
    pub label: SegmentLabel,
    pub mass: f32,
    /// Rest-pose position of the segment's center
    pub position: Vec3,
    /// Full extent along the segment's primary axis
    pub length: f32,
    pub shapes: Vec<ShapeSpec>,
}

/// Axis both bodies twist around, expressed in each body's local frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwistAxis {
    X,
    Z,
}

/// Twist-limited rotational joint between two segments
///
/// Immutable once registered with the dynamics engine. `swing` limits the
/// two off-axis angles, `twist` limits rotation about the axis itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointSpec {
    pub label: JointLabel,
    pub body_a: usize,
    pub body_b: usize,
    pub pivot_a: Vec3,
    pub pivot_b: Vec3,
    pub axis: TwistAxis,
    pub swing: f32,
    pub twist: f32,
}

/// Segment dimensions, all deterministic linear functions of scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SegmentDims {
    /// The size multiplier everything below was derived from
    pub scale: f32,
    pub shoulders_distance: f32,
    pub upper_arm_length: f32,
    pub lower_arm_length: f32,
    pub upper_arm_size: f32,
    pub lower_arm_size: f32,
    pub neck_length: f32,
    pub head_radius: f32,
    pub upper_body_length: f32,
    pub pelvis_length: f32,
    pub upper_leg_length: f32,
    pub upper_leg_size: f32,
    pub lower_leg_length: f32,
    pub lower_leg_size: f32,
    pub foot_length: f32,
    pub foot_width: f32,
    pub foot_height: f32,
    pub heel_radius: f32,
    pub joint_padding: f32,
}

impl SegmentDims {
    /// Derive all segment dimensions from the overall size multiplier
    pub fn from_scale(scale: f32) -> Self {
        Self {
            scale,
            shoulders_distance: 0.5 * scale,
            upper_arm_length: 0.5 * scale,
            lower_arm_length: 0.5 * scale,
            upper_arm_size: 0.2 * scale,
            lower_arm_size: 0.2 * scale,
            neck_length: 0.1 * scale,
            head_radius: 0.25 * scale,
            upper_body_length: 0.6 * scale,
            pelvis_length: 0.4 * scale,
            upper_leg_length: 0.5 * scale,
            upper_leg_size: 0.2 * scale,
            lower_leg_length: 0.5 * scale,
            lower_leg_size: 0.2 * scale,
            foot_length: 0.15 * scale,
            foot_width: 0.15 * scale,
            foot_height: 0.05 * scale,
            heel_radius: 0.1 * scale,
            joint_padding: 0.05 * scale,
        }
    }
}

/// Abstract skeleton: ordered body placements plus joint specs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkeletonSpec {
    pub segments: Vec<BodySegment>,
    pub joints: Vec<JointSpec>,
    pub dims: SegmentDims,
}

impl SkeletonSpec {
    /// Build the fixed biped skeleton for the given configuration.
    ///
    /// Segment order and joint order are deterministic: rebuilding with the
    /// same configuration yields identical specs in identical order.
    pub fn biped(config: &RigConfig) -> Result<Self, RigError> {
        if !(config.scale > 0.0) || !config.scale.is_finite() {
            return Err(RigError::InvalidScale {
                scale: config.scale,
            });
        }

        let d = SegmentDims::from_scale(config.scale);
        let swing = config.bend_angle;
        let twist = config.twist_angle;
        // A swing cone wider than a half turn is equivalent to unconstrained.
        let shoulder_swing = config.shoulder_angle.min(PI);
        let shoulder_twist = FRAC_PI_2;

        let mut segments = Vec::with_capacity(13);

        let leg_box = ShapeKind::Box {
            half_extents: Vec3::new(
                d.lower_leg_size * 0.5,
                d.lower_arm_size * 0.5,
                d.lower_leg_length * 0.5 - d.joint_padding,
            ),
        };
        let upper_leg_box = ShapeKind::Box {
            half_extents: Vec3::new(
                d.upper_leg_size * 0.5,
                d.lower_arm_size * 0.5,
                d.upper_leg_length * 0.5 - d.joint_padding,
            ),
        };

        // Lower legs
        let lower_leg_z = d.lower_leg_length / 2.0;
        for (label, side) in [
            (SegmentLabel::LowerLegLeft, 1.0f32),
            (SegmentLabel::LowerLegRight, -1.0f32),
        ] {
            segments.push(BodySegment {
                label,
                mass: 1.0,
                position: Vec3::new(side * d.shoulders_distance / 2.0, 0.0, lower_leg_z),
                length: d.lower_leg_length,
                shapes: vec![ShapeSpec::centered(leg_box.clone())],
            });
        }

        // Upper legs
        let upper_leg_z = lower_leg_z + d.lower_leg_length / 2.0 + d.upper_leg_length / 2.0;
        for (label, side) in [
            (SegmentLabel::UpperLegLeft, 1.0f32),
            (SegmentLabel::UpperLegRight, -1.0f32),
        ] {
            segments.push(BodySegment {
                label,
                mass: 1.0,
                position: Vec3::new(side * d.shoulders_distance / 2.0, 0.0, upper_leg_z),
                length: d.upper_leg_length,
                shapes: vec![ShapeSpec::centered(upper_leg_box.clone())],
            });
        }

        // Feet: composite of a heel cylinder and a flat foot box
        let foot_z = lower_leg_z - d.lower_leg_length / 2.0;
        for (label, side) in [
            (SegmentLabel::FootLeft, 1.0f32),
            (SegmentLabel::FootRight, -1.0f32),
        ] {
            segments.push(BodySegment {
                label,
                mass: 0.2,
                position: Vec3::new(side * d.shoulders_distance / 2.0, 0.0, foot_z),
                length: d.foot_length,
                shapes: vec![
                    ShapeSpec {
                        kind: ShapeKind::Cylinder {
                            half_height: d.foot_width / 2.0,
                            radius: d.heel_radius,
                        },
                        offset: Vec3::new(0.0, d.heel_radius, 0.0),
                        rotation: Quat::from_rotation_z(FRAC_PI_2),
                    },
                    ShapeSpec {
                        kind: ShapeKind::Box {
                            half_extents: Vec3::new(d.foot_width, d.foot_length, d.foot_height),
                        },
                        offset: Vec3::new(0.0, -d.foot_length / 2.0 - d.heel_radius, 0.0),
                        rotation: Quat::IDENTITY,
                    },
                ],
            });
        }

        // Pelvis
        let pelvis_z = upper_leg_z + d.upper_leg_length / 2.0 + d.pelvis_length / 2.0;
        segments.push(BodySegment {
            label: SegmentLabel::Pelvis,
            mass: 1.0,
            position: Vec3::new(0.0, 0.0, pelvis_z),
            length: d.pelvis_length,
            shapes: vec![ShapeSpec::centered(ShapeKind::Box {
                half_extents: Vec3::new(
                    d.shoulders_distance * 0.5,
                    d.lower_arm_size * 0.5,
                    d.pelvis_length * 0.5 - d.joint_padding,
                ),
            })],
        });

        // Upper body
        let upper_body_z = pelvis_z + d.pelvis_length / 2.0 + d.upper_body_length / 2.0;
        segments.push(BodySegment {
            label: SegmentLabel::UpperBody,
            mass: 1.0,
            position: Vec3::new(0.0, 0.0, upper_body_z),
            length: d.upper_body_length,
            shapes: vec![ShapeSpec::centered(ShapeKind::Box {
                half_extents: Vec3::new(
                    d.shoulders_distance * 0.5,
                    d.lower_arm_size * 0.5,
                    d.upper_body_length * 0.5 - d.joint_padding,
                ),
            })],
        });

        // Head
        let head_z = upper_body_z + d.upper_body_length / 2.0 + d.head_radius + d.neck_length;
        segments.push(BodySegment {
            label: SegmentLabel::Head,
            mass: 1.0,
            position: Vec3::new(0.0, 0.0, head_z),
            length: d.head_radius * 2.0 + d.neck_length,
            shapes: vec![ShapeSpec::centered(ShapeKind::Sphere {
                radius: d.head_radius,
            })],
        });

        // Upper arms, extending outward along x at shoulder height
        let shoulder_z = upper_body_z + d.upper_body_length / 2.0;
        let upper_arm_box = ShapeKind::Box {
            half_extents: Vec3::new(
                d.upper_arm_length * 0.5 - d.joint_padding,
                d.upper_arm_size * 0.5,
                d.upper_arm_size * 0.5,
            ),
        };
        for (label, side) in [
            (SegmentLabel::UpperArmLeft, 1.0f32),
            (SegmentLabel::UpperArmRight, -1.0f32),
        ] {
            segments.push(BodySegment {
                label,
                mass: 1.0,
                position: Vec3::new(
                    side * (d.shoulders_distance / 2.0 + d.upper_arm_length / 2.0),
                    0.0,
                    shoulder_z,
                ),
                length: d.upper_arm_length,
                shapes: vec![ShapeSpec::centered(upper_arm_box.clone())],
            });
        }

        // Lower arms
        let lower_arm_box = ShapeKind::Box {
            half_extents: Vec3::new(
                d.lower_arm_length * 0.5 - d.joint_padding,
                d.lower_arm_size * 0.5,
                d.lower_arm_size * 0.5,
            ),
        };
        for (label, side) in [
            (SegmentLabel::LowerArmLeft, 1.0f32),
            (SegmentLabel::LowerArmRight, -1.0f32),
        ] {
            segments.push(BodySegment {
                label,
                mass: 1.0,
                position: Vec3::new(
                    side * (d.shoulders_distance / 2.0
                        + d.upper_arm_length
                        + d.lower_arm_length / 2.0),
                    0.0,
                    shoulder_z,
                ),
                length: d.lower_arm_length,
                shapes: vec![ShapeSpec::centered(lower_arm_box.clone())],
            });
        }

        let spec = Self {
            segments,
            joints: Vec::new(),
            dims: d,
        };

        let idx = |label: SegmentLabel| spec.index_of(label);

        let joints = vec![
            JointSpec {
                label: JointLabel::Neck,
                body_a: idx(SegmentLabel::Head),
                body_b: idx(SegmentLabel::UpperBody),
                pivot_a: Vec3::new(0.0, 0.0, -d.head_radius - d.neck_length / 2.0),
                pivot_b: Vec3::new(0.0, 0.0, d.upper_body_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::KneeLeft,
                body_a: idx(SegmentLabel::LowerLegLeft),
                body_b: idx(SegmentLabel::UpperLegLeft),
                pivot_a: Vec3::new(0.0, 0.0, d.lower_leg_length / 2.0),
                pivot_b: Vec3::new(0.0, 0.0, -d.upper_leg_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::KneeRight,
                body_a: idx(SegmentLabel::LowerLegRight),
                body_b: idx(SegmentLabel::UpperLegRight),
                pivot_a: Vec3::new(0.0, 0.0, d.lower_leg_length / 2.0),
                pivot_b: Vec3::new(0.0, 0.0, -d.upper_leg_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::AnkleLeft,
                body_a: idx(SegmentLabel::FootLeft),
                body_b: idx(SegmentLabel::LowerLegLeft),
                pivot_a: Vec3::new(0.0, 0.0, d.heel_radius),
                pivot_b: Vec3::new(0.0, 0.0, -d.lower_leg_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::AnkleRight,
                body_a: idx(SegmentLabel::FootRight),
                body_b: idx(SegmentLabel::LowerLegRight),
                pivot_a: Vec3::new(0.0, 0.0, d.heel_radius),
                pivot_b: Vec3::new(0.0, 0.0, -d.lower_leg_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::HipLeft,
                body_a: idx(SegmentLabel::UpperLegLeft),
                body_b: idx(SegmentLabel::Pelvis),
                pivot_a: Vec3::new(0.0, 0.0, d.upper_leg_length / 2.0),
                pivot_b: Vec3::new(d.shoulders_distance / 2.0, 0.0, -d.pelvis_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::HipRight,
                body_a: idx(SegmentLabel::UpperLegRight),
                body_b: idx(SegmentLabel::Pelvis),
                pivot_a: Vec3::new(0.0, 0.0, d.upper_leg_length / 2.0),
                pivot_b: Vec3::new(-d.shoulders_distance / 2.0, 0.0, -d.pelvis_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::Spine,
                body_a: idx(SegmentLabel::Pelvis),
                body_b: idx(SegmentLabel::UpperBody),
                pivot_a: Vec3::new(0.0, 0.0, d.pelvis_length / 2.0),
                pivot_b: Vec3::new(0.0, 0.0, -d.upper_body_length / 2.0),
                axis: TwistAxis::Z,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::ShoulderLeft,
                body_a: idx(SegmentLabel::UpperBody),
                body_b: idx(SegmentLabel::UpperArmLeft),
                pivot_a: Vec3::new(d.shoulders_distance / 2.0, 0.0, d.upper_body_length / 2.0),
                pivot_b: Vec3::new(-d.upper_arm_length / 2.0, 0.0, 0.0),
                axis: TwistAxis::X,
                swing: shoulder_swing,
                twist: shoulder_twist,
            },
            JointSpec {
                label: JointLabel::ShoulderRight,
                body_a: idx(SegmentLabel::UpperBody),
                body_b: idx(SegmentLabel::UpperArmRight),
                pivot_a: Vec3::new(-d.shoulders_distance / 2.0, 0.0, d.upper_body_length / 2.0),
                pivot_b: Vec3::new(d.upper_arm_length / 2.0, 0.0, 0.0),
                axis: TwistAxis::X,
                swing: shoulder_swing,
                twist: shoulder_twist,
            },
            JointSpec {
                label: JointLabel::ElbowLeft,
                body_a: idx(SegmentLabel::LowerArmLeft),
                body_b: idx(SegmentLabel::UpperArmLeft),
                pivot_a: Vec3::new(-d.lower_arm_length / 2.0, 0.0, 0.0),
                pivot_b: Vec3::new(d.upper_arm_length / 2.0, 0.0, 0.0),
                axis: TwistAxis::X,
                swing,
                twist,
            },
            JointSpec {
                label: JointLabel::ElbowRight,
                body_a: idx(SegmentLabel::LowerArmRight),
                body_b: idx(SegmentLabel::UpperArmRight),
                pivot_a: Vec3::new(d.lower_arm_length / 2.0, 0.0, 0.0),
                pivot_b: Vec3::new(-d.upper_arm_length / 2.0, 0.0, 0.0),
                axis: TwistAxis::X,
                swing,
                twist,
            },
        ];

        Ok(Self {
            joints,
            ..spec
        })
    }

    /// Index of the segment carrying the given label.
    ///
    /// Every label occurs exactly once in a biped skeleton.
    pub fn index_of(&self, label: SegmentLabel) -> usize {
        self.segments
            .iter()
            .position(|s| s.label == label)
            .expect("biped skeleton carries every segment label")
    }

    /// Rest-pose position of the labeled segment's center
    pub fn position_of(&self, label: SegmentLabel) -> Vec3 {
        self.segments[self.index_of(label)].position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biped_has_thirteen_segments() {
        let spec = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        assert_eq!(spec.segments.len(), 13);
    }

    #[test]
    fn test_biped_joint_census() {
        let spec = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        assert_eq!(spec.joints.len(), 12);

        let count = |label: JointLabel| spec.joints.iter().filter(|j| j.label == label).count();
        assert_eq!(count(JointLabel::Neck), 1);
        assert_eq!(count(JointLabel::KneeLeft) + count(JointLabel::KneeRight), 2);
        assert_eq!(
            count(JointLabel::AnkleLeft) + count(JointLabel::AnkleRight),
            2
        );
        assert_eq!(count(JointLabel::HipLeft) + count(JointLabel::HipRight), 2);
        assert_eq!(count(JointLabel::Spine), 1);
        assert_eq!(
            count(JointLabel::ShoulderLeft) + count(JointLabel::ShoulderRight),
            2
        );
        assert_eq!(
            count(JointLabel::ElbowLeft) + count(JointLabel::ElbowRight),
            2
        );
    }

    #[test]
    fn test_dimensions_scale_linearly() {
        let d1 = SegmentDims::from_scale(1.0);
        let d3 = SegmentDims::from_scale(3.0);
        assert_eq!(d3.lower_leg_length, 3.0 * d1.lower_leg_length);
        assert_eq!(d3.head_radius, 3.0 * d1.head_radius);
        assert_eq!(d3.shoulders_distance, 3.0 * d1.shoulders_distance);
    }

    #[test]
    fn test_placement_is_a_half_length_chain() {
        let spec = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let d = spec.dims;

        let lower = spec.position_of(SegmentLabel::LowerLegLeft);
        let upper = spec.position_of(SegmentLabel::UpperLegLeft);
        assert_eq!(
            upper.z,
            lower.z + d.lower_leg_length / 2.0 + d.upper_leg_length / 2.0
        );

        let pelvis = spec.position_of(SegmentLabel::Pelvis);
        let upper_body = spec.position_of(SegmentLabel::UpperBody);
        assert_eq!(
            upper_body.z,
            pelvis.z + d.pelvis_length / 2.0 + d.upper_body_length / 2.0
        );

        let head = spec.position_of(SegmentLabel::Head);
        assert_eq!(
            head.z,
            upper_body.z + d.upper_body_length / 2.0 + d.head_radius + d.neck_length
        );
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let config = RigConfig::default();
        let a = SkeletonSpec::biped(&config).unwrap();
        let b = SkeletonSpec::biped(&config).unwrap();

        assert_eq!(a.segments.len(), b.segments.len());
        for (sa, sb) in a.segments.iter().zip(&b.segments) {
            assert_eq!(sa.label, sb.label);
            assert_eq!(sa.position, sb.position);
            assert_eq!(sa.mass, sb.mass);
        }
        for (ja, jb) in a.joints.iter().zip(&b.joints) {
            assert_eq!(ja.label, jb.label);
            assert_eq!(ja.pivot_a, jb.pivot_a);
            assert_eq!(ja.pivot_b, jb.pivot_b);
        }
    }

    #[test]
    fn test_nonpositive_scale_is_rejected() {
        for scale in [0.0, -1.0, f32::NAN] {
            let config = RigConfig {
                scale,
                ..RigConfig::default()
            };
            assert!(matches!(
                SkeletonSpec::biped(&config),
                Err(RigError::InvalidScale { .. })
            ));
        }
    }

    #[test]
    fn test_shoulder_swing_is_capped() {
        let spec = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let shoulder = spec
            .joints
            .iter()
            .find(|j| j.label == JointLabel::ShoulderLeft)
            .unwrap();
        assert_eq!(shoulder.swing, PI);
        assert_eq!(shoulder.twist, FRAC_PI_2);
        assert_eq!(shoulder.axis, TwistAxis::X);
    }

    #[test]
    fn test_feet_are_composite() {
        let spec = SkeletonSpec::biped(&RigConfig::default()).unwrap();
        let foot = &spec.segments[spec.index_of(SegmentLabel::FootLeft)];
        assert_eq!(foot.shapes.len(), 2);
        assert!(matches!(foot.shapes[0].kind, ShapeKind::Cylinder { .. }));
        assert!(matches!(foot.shapes[1].kind, ShapeKind::Box { .. }));
        assert_eq!(foot.mass, 0.2);
    }
}
