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

//! Broad- and narrow-phase collision detection.

use super::{PhysicsBody, GROUND_ID};
use crate::math::Vec3;

/// Normal used whenever a contact direction cannot be derived.
pub const FALLBACK_NORMAL: Vec3 = Vec3::Y;

/// Center distance below which two bodies are treated as coincident.
pub const COINCIDENT_DISTANCE: f64 = 1e-4;

/// Details of one contact produced during a step.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionInfo {
    /// Id of the first body.
    pub body_a: String,
    /// Id of the second body, or [`GROUND_ID`].
    pub body_b: String,
    /// Penetration depth, never negative.
    pub depth: f64,
    /// Unit contact normal pointing from `body_b` towards `body_a`.
    pub normal: Vec3,
    /// Approximate world-space contact point.
    pub point: Option<Vec3>,
    /// `true` when the fallback normal and depth were substituted.
    pub degenerate: bool,
}

impl CollisionInfo {
    /// Returns `true` if the contact is against the ground plane.
    #[inline]
    pub fn is_ground(&self) -> bool {
        self.body_b == GROUND_ID
    }
}

/// The implicit, infinite-mass ground plane `y = level`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    /// Height of the plane.
    pub level: f64,
    /// Clearance left above the plane after positional correction.
    pub margin: f64,
    /// Fraction of horizontal velocity removed per contact, scaled by friction.
    pub damping: f64,
    /// Vertical speed below which the body is put to rest.
    pub sleep_threshold: f64,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            level: 0.0,
            margin: 0.001,
            damping: 0.1,
            sleep_threshold: 0.05,
        }
    }
}

/// Stateless collision detector.
///
/// The broad phase is an AABB overlap test grown by `contact_margin`. The
/// narrow phase approximates each body with a sphere whose radius is half its
/// smallest extent. Every emitted [`CollisionInfo`] has a finite unit normal
/// and a finite, non-negative depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionDetector {
    /// AABB growth used to catch resting contact.
    pub contact_margin: f64,
    /// Depth reported for coincident bodies.
    pub degenerate_overlap: f64,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self {
            contact_margin: 0.01,
            degenerate_overlap: 0.05,
        }
    }
}

impl CollisionDetector {
    /// Creates a detector.
    pub fn new(contact_margin: f64, degenerate_overlap: f64) -> Self {
        Self {
            contact_margin,
            degenerate_overlap,
        }
    }

    /// Tests the margin-grown bounding boxes of two bodies for overlap.
    #[inline]
    pub fn broad_phase(&self, a: &PhysicsBody, b: &PhysicsBody) -> bool {
        let half_margin = self.contact_margin * 0.5;
        a.aabb()
            .expanded(half_margin)
            .intersects_aabb(&b.aabb().expanded(half_margin))
    }

    /// Computes the contact between two bodies whose boxes overlap.
    pub fn narrow_phase(&self, a: &PhysicsBody, b: &PhysicsBody) -> CollisionInfo {
        let diff = a.position - b.position;
        let dist = diff.length();

        let contact = if dist.is_finite() && dist >= COINCIDENT_DISTANCE {
            let normal = diff / dist;
            let depth = (a.radius() + b.radius() - dist).max(0.0);
            let point = b.position + normal * b.radius();
            Some((normal, depth, point))
        } else {
            None
        };

        match contact {
            Some((normal, depth, point))
                if normal.is_finite() && depth.is_finite() && point.is_finite() =>
            {
                CollisionInfo {
                    body_a: a.id().to_string(),
                    body_b: b.id().to_string(),
                    depth,
                    normal,
                    point: Some(point),
                    degenerate: false,
                }
            }
            _ => self.fallback(a, b),
        }
    }

    /// Runs both phases for a pair of bodies.
    pub fn detect(&self, a: &PhysicsBody, b: &PhysicsBody) -> Option<CollisionInfo> {
        if self.broad_phase(a, b) {
            Some(self.narrow_phase(a, b))
        } else {
            None
        }
    }

    /// Tests a body against the ground plane.
    pub fn detect_ground(&self, body: &PhysicsBody, ground: &GroundPlane) -> Option<CollisionInfo> {
        let depth = ground.level - body.bottom();
        if depth.is_nan() || depth <= 0.0 {
            return None;
        }
        let (depth, degenerate) = if depth.is_finite() {
            (depth, false)
        } else {
            (self.degenerate_overlap, true)
        };
        let point = Vec3::new(body.position.x, ground.level, body.position.z);
        Some(CollisionInfo {
            body_a: body.id().to_string(),
            body_b: GROUND_ID.to_string(),
            depth,
            normal: FALLBACK_NORMAL,
            point: point.is_finite().then_some(point),
            degenerate,
        })
    }

    fn fallback(&self, a: &PhysicsBody, b: &PhysicsBody) -> CollisionInfo {
        log::debug!(
            "Degenerate contact between `{}` and `{}`, using fallback normal",
            a.id(),
            b.id()
        );
        CollisionInfo {
            body_a: a.id().to_string(),
            body_b: b.id().to_string(),
            depth: self.degenerate_overlap,
            normal: FALLBACK_NORMAL,
            point: a.position.is_finite().then_some(a.position),
            degenerate: true,
        }
    }
}
