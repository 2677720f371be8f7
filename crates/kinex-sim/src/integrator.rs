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

//! Semi-implicit Euler integration.

use kinex_core::math::{finite_or, Vec3};
use kinex_core::physics::{BodyType, PhysicsBody};

use crate::scheduler::cost;

/// Advances bodies by one timestep.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    gravity: Vec3,
}

impl Integrator {
    /// Creates an integrator applying `gravity` to dynamic bodies.
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }

    /// Operations charged for integrating `body`.
    pub fn cost(body: &PhysicsBody) -> u64 {
        let mut ops = cost::BODY;
        if body.body_type.is_dynamic() {
            ops += cost::GRAVITY;
        }
        if body.joint.is_hinge() {
            ops += cost::JOINT;
        }
        ops
    }

    /// Integrates one body in place.
    ///
    /// Returns the number of state components that came out non-finite and were
    /// restored to their pre-step value (or zero).
    pub fn integrate(&self, body: &mut PhysicsBody, dt: f64) -> u32 {
        let prev_position = body.position;
        let prev_velocity = body.velocity;
        let mut corrections = 0;

        // Gravity enters as F = m * g, so the acceleration is g itself.
        if body.body_type.is_dynamic() {
            body.acceleration += self.gravity;
        }

        if body.joint.is_hinge() {
            let joint = &mut body.joint;
            let angular_velocity = joint.angular_velocity + joint.torque * dt;
            let angle = joint.angle + angular_velocity * dt;
            if !angular_velocity.is_finite() || !angle.is_finite() {
                corrections += 1;
            }
            joint.angular_velocity = finite_or(angular_velocity, 0.0);
            joint.angle = finite_or(angle, joint.angle);
            joint.clamp_to_limits();
        }

        if body.body_type != BodyType::Static {
            body.velocity += body.acceleration * dt;
            body.position += body.velocity * dt;
        }
        body.acceleration = Vec3::ZERO;

        if !body.velocity.is_finite() {
            corrections += 1;
            body.velocity = body.velocity.finite_or(prev_velocity);
        }
        if !body.position.is_finite() {
            corrections += 1;
            body.position = body.position.finite_or(prev_position);
        }
        corrections
    }
}
