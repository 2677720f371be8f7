// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{BodyType, JointState, MAX_MASS, MIN_MASS};
use crate::math::{saturate_or, Aabb, Vec3, PI};

const DEFAULT_RESTITUTION: f64 = 0.5;
const DEFAULT_FRICTION: f64 = 0.3;

/// Clamps a mass into `[MIN_MASS, MAX_MASS]`. NaN maps to `MIN_MASS`.
#[inline]
pub fn sanitize_mass(mass: f64) -> f64 {
    if mass.is_nan() || mass < MIN_MASS {
        MIN_MASS
    } else if mass > MAX_MASS {
        MAX_MASS
    } else {
        mass
    }
}

/// One rigid object in a simulated world.
///
/// Kinematic state (`position`, `velocity`, `acceleration`, `size`, `joint`)
/// is public. Mass and material coefficients are private so their invariants
/// hold after every mutation: mass never drops below [`MIN_MASS`], and
/// restitution and friction stay within `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    id: String,
    /// Motion category.
    pub body_type: BodyType,
    /// Center position, in meters.
    pub position: Vec3,
    /// Linear velocity, in meters per second.
    pub velocity: Vec3,
    /// Accumulated acceleration for the current step, in meters per second squared.
    pub acceleration: Vec3,
    /// Axis-aligned extents, in meters.
    pub size: Vec3,
    /// Actuated-joint sub-state.
    pub joint: JointState,
    mass: f64,
    restitution: f64,
    friction: f64,
    parent_id: Option<String>,
}

impl PhysicsBody {
    /// Creates a body at rest with default material coefficients.
    pub fn new(
        id: impl Into<String>,
        body_type: BodyType,
        position: Vec3,
        size: Vec3,
        mass: f64,
    ) -> Self {
        let id = id.into();
        let clamped = sanitize_mass(mass);
        if clamped != mass {
            log::debug!("Body `{}`: mass {} clamped to {}", id, mass, clamped);
        }
        Self {
            id,
            body_type,
            position: position.finite_or(Vec3::ZERO),
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            size: size.abs().finite_or(Vec3::ONE),
            joint: JointState::default(),
            mass: clamped,
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_FRICTION,
            parent_id: None,
        }
    }

    /// Creates a [`BodyType::Dynamic`] body.
    pub fn dynamic(id: impl Into<String>, position: Vec3, size: Vec3, mass: f64) -> Self {
        Self::new(id, BodyType::Dynamic, position, size, mass)
    }

    /// Creates a [`BodyType::Static`] body.
    pub fn fixed(id: impl Into<String>, position: Vec3, size: Vec3) -> Self {
        Self::new(id, BodyType::Static, position, size, 1.0)
    }

    /// Creates a [`BodyType::Kinematic`] body.
    pub fn kinematic(id: impl Into<String>, position: Vec3, size: Vec3) -> Self {
        Self::new(id, BodyType::Kinematic, position, size, 1.0)
    }

    /// A 1 kg, 0.3 m hinge-actuated arm segment.
    pub fn robot_arm(id: impl Into<String>, position: Vec3) -> Self {
        Self::dynamic(id, position, Vec3::new(0.3, 0.3, 0.3), 1.0)
            .with_material(0.3, 0.2)
            .with_joint(JointState::hinge(-PI, PI))
    }

    /// A 5 kg wheeled base.
    pub fn mobile_robot(id: impl Into<String>, position: Vec3) -> Self {
        Self::dynamic(id, position, Vec3::new(0.5, 0.3, 0.5), 5.0).with_material(0.5, 0.3)
    }

    /// Sets the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity.finite_or(Vec3::ZERO);
        self
    }

    /// Sets friction and restitution, clamped to `[0, 1]`.
    pub fn with_material(mut self, friction: f64, restitution: f64) -> Self {
        self.set_material(friction, restitution);
        self
    }

    /// Sets the joint sub-state.
    pub fn with_joint(mut self, joint: JointState) -> Self {
        self.joint = joint;
        self
    }

    /// Sets the parent link. Only honoured for dynamic bodies.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// The caller-assigned identifier.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The stored mass, always within `[MIN_MASS, MAX_MASS]`.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Sets the mass, clamping it into range.
    ///
    /// Returns `true` if the value had to be corrected.
    pub fn set_mass(&mut self, mass: f64) -> bool {
        self.mass = sanitize_mass(mass);
        self.mass != mass
    }

    /// `1 / mass` for dynamic bodies, `0` for static and kinematic ones.
    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        if self.body_type.is_dynamic() {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Restitution coefficient in `[0, 1]`.
    #[inline]
    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    /// Friction coefficient in `[0, 1]`.
    #[inline]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// Sets the restitution coefficient, clamped to `[0, 1]`.
    pub fn set_restitution(&mut self, restitution: f64) {
        self.restitution = saturate_or(restitution, DEFAULT_RESTITUTION);
    }

    /// Sets the friction coefficient, clamped to `[0, 1]`.
    pub fn set_friction(&mut self, friction: f64) {
        self.friction = saturate_or(friction, DEFAULT_FRICTION);
    }

    /// Sets both material coefficients.
    pub fn set_material(&mut self, friction: f64, restitution: f64) {
        self.set_friction(friction);
        self.set_restitution(restitution);
    }

    /// The id of the kinematic anchor this body rides on, if any.
    #[inline]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Replaces the parent link.
    pub fn set_parent_id(&mut self, parent_id: Option<String>) {
        self.parent_id = parent_id;
    }

    /// Half of `size` on each axis.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        self.size.abs() * 0.5
    }

    /// Approximate collision radius: half of the smallest extent.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.half_extents().min_element()
    }

    /// The y coordinate of the bottom face.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.position.y - self.half_extents().y
    }

    /// The y coordinate of the top face.
    #[inline]
    pub fn top(&self) -> f64 {
        self.position.y + self.half_extents().y
    }

    /// The world-space bounding box `position ± size / 2`.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.position, self.half_extents())
    }

    /// `0.5 * m * |v|^2`.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Zeroes velocity, acceleration and joint torque. Used before a pooled body is reused.
    pub fn reset_motion(&mut self) {
        self.velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.joint.torque = 0.0;
        self.joint.angular_velocity = 0.0;
    }

    /// Resets motion state and takes on a new identity, dropping any parent link.
    pub fn recycle(mut self, id: impl Into<String>) -> Self {
        self.reset_motion();
        self.id = id.into();
        self.parent_id = None;
        self
    }
}
