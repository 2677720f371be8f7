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

//! Fitness and state summaries consumed by training loops.

use std::collections::BTreeMap;

use kinex_core::physics::{BodyType, JointType, PhysicsBody};
use serde::{Deserialize, Serialize};

/// Aggregate motion statistics used for selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessMetrics {
    /// Sum of `0.5 m |v|²` over all bodies, in joules.
    pub total_kinetic_energy: f64,
    /// Mean speed over all bodies, in m/s.
    pub average_velocity: f64,
    /// Highest speed of any body, in m/s.
    pub max_velocity: f64,
    /// `1 / (1 + |E - E_target|)`, peaking at 1 when the energy hits the target.
    pub stability: f64,
    /// Steps executed so far.
    pub step_count: u64,
}

impl FitnessMetrics {
    /// Computes the metrics over `bodies`.
    pub fn compute(bodies: &[PhysicsBody], target_energy: f64, step_count: u64) -> Self {
        let mut total_kinetic_energy = 0.0;
        let mut speed_sum = 0.0;
        let mut max_velocity: f64 = 0.0;
        for body in bodies {
            let speed = body.velocity.length();
            total_kinetic_energy += body.kinetic_energy();
            speed_sum += speed;
            max_velocity = max_velocity.max(speed);
        }
        let average_velocity = speed_sum / bodies.len().max(1) as f64;
        let stability = 1.0 / (1.0 + (total_kinetic_energy - target_energy).abs());

        Self {
            total_kinetic_energy,
            average_velocity,
            max_velocity,
            stability: if stability.is_finite() { stability } else { 0.0 },
            step_count,
        }
    }
}

/// Per-body entry of a [`PhysicsState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    /// Center position.
    pub position: [f64; 3],
    /// Linear velocity.
    pub velocity: [f64; 3],
    /// Motion category.
    pub body_type: BodyType,
    /// Joint model.
    pub joint_type: JointType,
}

/// A read-only overview of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsState {
    /// Number of registered bodies.
    pub object_count: usize,
    /// Contacts resolved by the last executed step.
    pub collision_count: usize,
    /// Mean operations per executed step.
    pub average_ops: f64,
    /// Whether the low-power throttle is active.
    pub low_power: bool,
    /// Effective update rate, in Hz.
    pub update_hz: f64,
    /// Steps executed so far.
    pub step_count: u64,
    /// Every body keyed by id.
    pub objects: BTreeMap<String, BodyState>,
}

impl From<&PhysicsBody> for BodyState {
    fn from(body: &PhysicsBody) -> Self {
        Self {
            position: body.position.to_array(),
            velocity: body.velocity.to_array(),
            body_type: body.body_type,
            joint_type: body.joint.joint_type,
        }
    }
}
