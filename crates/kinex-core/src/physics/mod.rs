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

//! # Physics Abstractions
//!
//! The rigid-body model and the stateless pieces of the collision pipeline.
//! Orchestration (integration order, budgets, constraints) lives in `kinex-sim`.

mod body;
mod collision;
mod solver;

pub use body::*;
pub use collision::*;
pub use solver::*;

use serde::{Deserialize, Serialize};

use crate::math::PI;

/// The smallest mass a body can carry, in kilograms.
pub const MIN_MASS: f64 = 1e-3;

/// The largest mass a body can carry, in kilograms. Infinite masses clamp here.
pub const MAX_MASS: f64 = 1e9;

/// The id reported for contacts against the implicit ground plane.
pub const GROUND_ID: &str = "ground";

/// Defines the motion category of a rigid body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Responds to gravity, forces and collision impulses.
    #[default]
    Dynamic,
    /// Fixed in place, does not move.
    Static,
    /// Moved by the caller through its velocity, never by forces or impulses.
    Kinematic,
}

impl BodyType {
    /// Returns `true` for [`BodyType::Dynamic`].
    #[inline]
    pub fn is_dynamic(self) -> bool {
        self == BodyType::Dynamic
    }
}

/// The actuation model of a body's joint sub-state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointType {
    /// The body is not an actuated joint.
    #[default]
    None,
    /// A single-axis revolute joint driven by torque.
    Hinge,
}

/// Actuated-joint state carried by a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    /// The joint model.
    pub joint_type: JointType,
    /// Current angle, in radians.
    pub angle: f64,
    /// Current angular velocity, in radians per second.
    pub angular_velocity: f64,
    /// Inclusive `(min, max)` angle limits, in radians.
    pub limits: (f64, f64),
    /// Torque applied on the next integration step.
    pub torque: f64,
}

impl Default for JointState {
    fn default() -> Self {
        Self {
            joint_type: JointType::None,
            angle: 0.0,
            angular_velocity: 0.0,
            limits: (-PI, PI),
            torque: 0.0,
        }
    }
}

impl JointState {
    /// Creates a hinge joint at rest with the given limits.
    pub fn hinge(min: f64, max: f64) -> Self {
        Self {
            joint_type: JointType::Hinge,
            limits: (min, max),
            ..Default::default()
        }
    }

    /// Returns `true` when the joint is a hinge.
    #[inline]
    pub fn is_hinge(&self) -> bool {
        self.joint_type == JointType::Hinge
    }

    /// Clamps the angle into the limits, zeroing the angular velocity on clamp.
    ///
    /// Returns `true` if the angle was clamped.
    pub fn clamp_to_limits(&mut self) -> bool {
        let (min, max) = self.limits;
        if self.angle < min {
            self.angle = min;
        } else if self.angle > max {
            self.angle = max;
        } else {
            return false;
        }
        self.angular_velocity = 0.0;
        true
    }
}
