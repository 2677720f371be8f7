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

//! # Impulse Solver
//!
//! Impulse-based collision response with Coulomb-style friction.

use super::{CollisionInfo, GroundPlane, PhysicsBody};
use crate::error::{PhysicsError, PhysicsResult};
use crate::math::Vec3;

/// Magnitudes of the impulses applied for one contact.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactImpulse {
    /// Normal impulse magnitude `j`.
    pub normal: f64,
    /// Friction impulse magnitude.
    pub friction: f64,
}

/// What the solver did with a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveOutcome {
    /// Neither body can move; nothing changed.
    Immovable,
    /// Positions were corrected, but the bodies were already separating.
    Separating,
    /// Positions were corrected and impulses applied.
    Impulse(ContactImpulse),
}

/// A solver for impulse-based contact resolution.
///
/// Inverse masses come from [`PhysicsBody::inverse_mass`], so static and
/// kinematic bodies behave as infinite mass without special cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpulseSolver {
    /// Tangential speed below which no friction is applied.
    pub tangent_threshold: f64,
}

impl ImpulseSolver {
    /// Creates a new `ImpulseSolver` with default constants.
    pub fn new() -> Self {
        Self {
            tangent_threshold: 1e-6,
        }
    }

    /// Resolves a contact between two bodies in place.
    ///
    /// Returns [`PhysicsError::NonFiniteValue`] without touching velocities
    /// when the impulse cannot be computed with finite values.
    pub fn resolve(
        &self,
        a: &mut PhysicsBody,
        b: &mut PhysicsBody,
        info: &CollisionInfo,
    ) -> PhysicsResult<ResolveOutcome> {
        let inv_mass_a = a.inverse_mass();
        let inv_mass_b = b.inverse_mass();
        let total_inv_mass = inv_mass_a + inv_mass_b;
        if total_inv_mass <= 0.0 {
            return Ok(ResolveOutcome::Immovable);
        }

        let normal = info.normal;

        // 1. Positional correction, split by inverse-mass share.
        let correction = normal * info.depth;
        a.position += correction * (inv_mass_a / total_inv_mass);
        b.position -= correction * (inv_mass_b / total_inv_mass);

        // 2. Normal impulse.
        let rel_vel = a.velocity - b.velocity;
        let vel_along_normal = rel_vel.dot(normal);
        if vel_along_normal > 0.0 {
            return Ok(ResolveOutcome::Separating);
        }

        let e = a.restitution().min(b.restitution());
        let j = -(1.0 + e) * vel_along_normal / total_inv_mass;
        if !j.is_finite() {
            return Err(PhysicsError::NonFiniteValue("normal impulse"));
        }

        let impulse = normal * j;
        a.velocity += impulse * inv_mass_a;
        b.velocity -= impulse * inv_mass_b;

        // 3. Friction, bounded so it can only damp tangential motion.
        let mu = a.friction().min(b.friction());
        let friction = self
            .friction_impulse(rel_vel, normal, vel_along_normal, j, mu, total_inv_mass)
            .map(|(direction, magnitude)| {
                let jt = direction * magnitude;
                a.velocity -= jt * inv_mass_a;
                b.velocity += jt * inv_mass_b;
                magnitude
            })
            .unwrap_or(0.0);

        Ok(ResolveOutcome::Impulse(ContactImpulse {
            normal: j,
            friction,
        }))
    }

    /// Resolves a contact between a body and the infinite-mass ground plane.
    pub fn resolve_ground(
        &self,
        body: &mut PhysicsBody,
        info: &CollisionInfo,
        ground: &GroundPlane,
    ) -> PhysicsResult<ResolveOutcome> {
        let inv_mass = body.inverse_mass();
        if inv_mass <= 0.0 {
            return Ok(ResolveOutcome::Immovable);
        }

        if info.depth > 0.0 {
            body.position.y = ground.level + body.half_extents().y + ground.margin;
        }

        let normal = info.normal;
        let vel_along_normal = body.velocity.dot(normal);
        let mut outcome = ResolveOutcome::Separating;

        if vel_along_normal < 0.0 {
            let j = -(1.0 + body.restitution()) * vel_along_normal / inv_mass;
            if !j.is_finite() {
                return Err(PhysicsError::NonFiniteValue("ground impulse"));
            }
            let rel_vel = body.velocity;
            body.velocity += normal * (j * inv_mass);

            let friction = self
                .friction_impulse(rel_vel, normal, vel_along_normal, j, body.friction(), inv_mass)
                .map(|(direction, magnitude)| {
                    body.velocity -= direction * (magnitude * inv_mass);
                    magnitude
                })
                .unwrap_or(0.0);

            outcome = ResolveOutcome::Impulse(ContactImpulse {
                normal: j,
                friction,
            });
        }

        // Settling: horizontal damping and vertical sleep.
        let keep = (1.0 - body.friction() * ground.damping).clamp(0.0, 1.0);
        body.velocity.x *= keep;
        body.velocity.z *= keep;
        if body.velocity.y.abs() < ground.sleep_threshold {
            body.velocity.y = 0.0;
        }

        Ok(outcome)
    }

    /// Direction and magnitude of the friction impulse for a contact, or
    /// `None` when there is no tangential motion to oppose.
    fn friction_impulse(
        &self,
        rel_vel: Vec3,
        normal: Vec3,
        vel_along_normal: f64,
        normal_impulse: f64,
        mu: f64,
        total_inv_mass: f64,
    ) -> Option<(Vec3, f64)> {
        let tangent = rel_vel - normal * vel_along_normal;
        let tangent_speed = tangent.length();
        if !tangent_speed.is_finite() || tangent_speed < self.tangent_threshold {
            return None;
        }
        let direction = tangent / tangent_speed;
        let stop_impulse = tangent_speed / total_inv_mass;
        let magnitude = (mu * normal_impulse.abs()).min(stop_impulse);
        (magnitude.is_finite() && magnitude > 0.0).then_some((direction, magnitude))
    }
}

impl Default for ImpulseSolver {
    fn default() -> Self {
        Self::new()
    }
}
