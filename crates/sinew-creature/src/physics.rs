//! Rigid body dynamics facade
//!
//! Wraps rapier3d behind the narrow contract the creature core consumes:
//! spawn bodies with attached shapes, register twist-limited rotational
//! joints, realize muscle spring forces, advance the sub-stepped pipeline,
//! and read poses back.

use glam::{Quat, Vec3};
use rapier3d::na;
use rapier3d::prelude::*;

use crate::muscle::MuscleInterface;
use crate::skeleton::{BodySegment, JointSpec, ShapeKind, ShapeSpec, TwistAxis};

/// Nominal fixed timestep (1/60 s)
pub const NOMINAL_TIMESTEP: f32 = 1.0 / 60.0;

/// Cap on physics sub-steps per tick, bounding worst-case work after a slow
/// wall-clock tick (e.g. a debugger pause)
pub const MAX_SUBSTEPS: usize = 20;

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    Rotation::from_quaternion(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

fn to_quat(r: &Rotation<Real>) -> Quat {
    Quat::from_xyzw(r.coords.x, r.coords.y, r.coords.z, r.coords.w)
}

/// Manages the rapier3d physics world
pub struct PhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    gravity: Vector<Real>,
}

impl PhysicsWorld {
    /// Create a world with a static ground slab under the origin
    pub fn new() -> Self {
        let mut world = Self::empty();

        let ground = ColliderBuilder::cuboid(10.0, 1.0, 10.0)
            .friction(0.8)
            .restitution(0.1)
            .build();
        world.collider_set.insert(ground);

        log::debug!("Physics: created ground slab 20x2x20 at the origin");

        world
    }

    /// Create an empty physics world (no ground, useful for pure-arithmetic
    /// tests and as a cheap placeholder)
    pub fn empty() -> Self {
        let integration_parameters = IntegrationParameters {
            dt: NOMINAL_TIMESTEP,
            ..Default::default()
        };

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            gravity: vector![0.0, -9.81, 0.0],
        }
    }

    /// Set the gravity vector applied on every step
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }

    /// Spawn a dynamic body for a skeleton segment.
    ///
    /// The segment's rest-pose position is rotated by `rotation` and shifted
    /// by `translation` before insertion, so a whole skeleton can be placed
    /// upright in the world with one shared transform. Shapes carry no mass
    /// of their own; the segment's mass is attached to the body directly.
    pub fn spawn_segment(
        &mut self,
        segment: &BodySegment,
        rotation: Quat,
        translation: Vec3,
    ) -> RigidBodyHandle {
        let world_position = rotation * segment.position + translation;

        let body = RigidBodyBuilder::dynamic()
            .position(Isometry::from_parts(
                Translation::from(to_vector(world_position)),
                to_rotation(rotation),
            ))
            .additional_mass(segment.mass)
            .build();
        let handle = self.rigid_body_set.insert(body);

        for shape in &segment.shapes {
            self.attach_shape(handle, shape);
        }

        handle
    }

    /// Attach one collision shape to a body, placed in the body's local frame
    pub fn attach_shape(&mut self, handle: RigidBodyHandle, shape: &ShapeSpec) -> ColliderHandle {
        let builder = match shape.kind {
            ShapeKind::Sphere { radius } => ColliderBuilder::ball(radius),
            ShapeKind::Box { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ShapeKind::Cylinder {
                half_height,
                radius,
            } => ColliderBuilder::cylinder(half_height, radius),
        };

        let collider = builder
            .position(Isometry::from_parts(
                Translation::from(to_vector(shape.offset)),
                to_rotation(shape.rotation),
            ))
            .density(0.0)
            .friction(0.5)
            .build();

        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set)
    }

    /// Register a twist-limited rotational joint between two spawned bodies.
    ///
    /// The swing limit binds the two angular axes orthogonal to the joint's
    /// twist axis; the twist limit binds the axis itself. Contacts between
    /// the two connected bodies are disabled, as segments overlap at pivots.
    pub fn create_joint(
        &mut self,
        bodies: &[RigidBodyHandle],
        spec: &JointSpec,
    ) -> ImpulseJointHandle {
        let builder = SphericalJointBuilder::new()
            .local_anchor1(to_point(spec.pivot_a))
            .local_anchor2(to_point(spec.pivot_b))
            .contacts_enabled(false);

        let builder = match spec.axis {
            TwistAxis::Z => builder
                .limits(JointAxis::AngX, [-spec.swing, spec.swing])
                .limits(JointAxis::AngY, [-spec.swing, spec.swing])
                .limits(JointAxis::AngZ, [-spec.twist, spec.twist]),
            TwistAxis::X => builder
                .limits(JointAxis::AngX, [-spec.twist, spec.twist])
                .limits(JointAxis::AngY, [-spec.swing, spec.swing])
                .limits(JointAxis::AngZ, [-spec.swing, spec.swing]),
        };

        self.impulse_joint_set
            .insert(bodies[spec.body_a], bodies[spec.body_b], builder, true)
    }

    /// Realize spring forces for every muscle from its current rest length.
    ///
    /// Accumulates forces at the world-space anchor points; forces from a
    /// previous sub-step must have been cleared first. Muscles whose anchors
    /// currently coincide contribute nothing (no direction can be derived).
    pub fn apply_muscle_forces(&mut self, muscles: &MuscleInterface) {
        let mut forces: Vec<(RigidBodyHandle, Vector<Real>, Point<Real>)> =
            Vec::with_capacity(muscles.len() * 2);

        for muscle in muscles {
            let (Some(rb_a), Some(rb_b)) = (
                self.rigid_body_set.get(muscle.body_a),
                self.rigid_body_set.get(muscle.body_b),
            ) else {
                continue;
            };

            let anchor_a = rb_a.position() * to_point(muscle.local_anchor_a);
            let anchor_b = rb_b.position() * to_point(muscle.local_anchor_b);

            let delta = anchor_b - anchor_a;
            let length = delta.norm();
            if length < 1.0e-6 {
                continue;
            }
            let direction = delta / length;

            let vel_a = rb_a.velocity_at_point(&anchor_a);
            let vel_b = rb_b.velocity_at_point(&anchor_b);
            let separation_rate = (vel_b - vel_a).dot(&direction);

            let magnitude = muscle.stiffness * (length - muscle.rest_length())
                + muscle.damping * separation_rate;
            let force = direction * magnitude;

            forces.push((muscle.body_a, force, anchor_a));
            forces.push((muscle.body_b, -force, anchor_b));
        }

        for (handle, force, point) in forces {
            if let Some(body) = self.rigid_body_set.get_mut(handle) {
                body.add_force_at_point(force, point, true);
            }
        }
    }

    /// Advance the simulation by one nominal sub-step, applying muscle
    /// spring forces for this sub-step first
    pub fn step(&mut self, muscles: &MuscleInterface) {
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
        }
        self.apply_muscle_forces(muscles);

        let physics_hooks = ();
        let event_handler = ();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
    }

    /// Advance the simulation to cover `elapsed` seconds of wall time.
    ///
    /// Runs `ceil(elapsed / dt)` nominal sub-steps, at least one and at most
    /// `max_substeps`. Returns the number of sub-steps taken so callers can
    /// advance their simulated clock by exactly that much.
    pub fn step_with_elapsed(
        &mut self,
        muscles: &MuscleInterface,
        elapsed: f64,
        max_substeps: usize,
    ) -> usize {
        let dt = self.integration_parameters.dt as f64;
        let substeps = if elapsed <= 0.0 {
            1
        } else {
            ((elapsed / dt).ceil() as usize).clamp(1, max_substeps)
        };

        for _ in 0..substeps {
            self.step(muscles);
        }
        substeps
    }

    /// Fixed timestep used for each sub-step
    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// World-space position of a body's center
    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let t = body.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    /// World-space orientation of a body
    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.rigid_body_set
            .get(handle)
            .map(|body| to_quat(body.rotation()))
    }

    /// Euler decomposition (roll, pitch, yaw) of a body's orientation
    pub fn body_euler(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let (roll, pitch, yaw) = body.rotation().euler_angles();
            Vec3::new(roll, pitch, yaw)
        })
    }

    /// World-space location of a body-local anchor point
    pub fn world_anchor(&self, handle: RigidBodyHandle, local: Vec3) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let p = body.position() * to_point(local);
            Vec3::new(p.x, p.y, p.z)
        })
    }

    /// Remove a body and everything attached to it (colliders, joints)
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Get reference to the rigid body set
    pub fn rigid_body_set(&self) -> &RigidBodySet {
        &self.rigid_body_set
    }

    /// Get mutable reference to the rigid body set
    pub fn rigid_body_set_mut(&mut self) -> &mut RigidBodySet {
        &mut self.rigid_body_set
    }

    /// Number of registered joints
    pub fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
