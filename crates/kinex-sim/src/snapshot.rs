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

//! Checkpoints of a world's bodies.
//!
//! The JSON form is the exchange format with external trainers:
//! `{"step": n, "objects": {id: {"position": [x, y, z], "velocity": [x, y, z],
//! "mass": m, "friction": f, "restitution": e}}}`. The remaining body fields
//! are optional and take their defaults when absent.

use std::collections::BTreeMap;

use kinex_core::math::Vec3;
use kinex_core::physics::{BodyType, JointState, PhysicsBody};
use kinex_core::{PhysicsError, PhysicsResult};
use serde::{Deserialize, Serialize};

fn unit_size() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

/// The persisted state of one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    /// Center position.
    pub position: [f64; 3],
    /// Linear velocity.
    pub velocity: [f64; 3],
    /// Mass in kilograms.
    pub mass: f64,
    /// Friction coefficient.
    pub friction: f64,
    /// Restitution coefficient.
    pub restitution: f64,
    /// Motion category.
    #[serde(default)]
    pub body_type: BodyType,
    /// Axis-aligned extents.
    #[serde(default = "unit_size")]
    pub size: [f64; 3],
    /// Kinematic anchor id.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Joint sub-state.
    #[serde(default)]
    pub joint: JointState,
}

impl From<&PhysicsBody> for BodyRecord {
    fn from(body: &PhysicsBody) -> Self {
        Self {
            position: body.position.to_array(),
            velocity: body.velocity.to_array(),
            mass: body.mass(),
            friction: body.friction(),
            restitution: body.restitution(),
            body_type: body.body_type,
            size: body.size.to_array(),
            parent_id: body.parent_id().map(str::to_string),
            joint: body.joint,
        }
    }
}

impl BodyRecord {
    /// Rebuilds the body with id `id`. Out-of-range values are clamped.
    pub fn to_body(&self, id: impl Into<String>) -> PhysicsBody {
        let mut body = PhysicsBody::new(
            id,
            self.body_type,
            Vec3::from(self.position),
            Vec3::from(self.size),
            self.mass,
        )
        .with_velocity(Vec3::from(self.velocity))
        .with_material(self.friction, self.restitution)
        .with_joint(self.joint);
        body.set_parent_id(self.parent_id.clone());
        body
    }
}

/// A checkpoint of every body at a given step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Steps executed when the checkpoint was taken.
    pub step: u64,
    /// Bodies keyed by id.
    pub objects: BTreeMap<String, BodyRecord>,
}

impl Snapshot {
    /// Captures `bodies` at `step`.
    pub fn capture<'a>(step: u64, bodies: impl IntoIterator<Item = &'a PhysicsBody>) -> Self {
        Self {
            step,
            objects: bodies
                .into_iter()
                .map(|body| (body.id().to_string(), BodyRecord::from(body)))
                .collect(),
        }
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> PhysicsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PhysicsError::Serialization(e.to_string()))
    }

    /// Parses the JSON checkpoint format.
    pub fn from_json(json: &str) -> PhysicsResult<Self> {
        serde_json::from_str(json).map_err(|e| PhysicsError::Serialization(e.to_string()))
    }

    /// Encodes to a compact binary checkpoint.
    pub fn to_bincode(&self) -> PhysicsResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| PhysicsError::Serialization(e.to_string()))
    }

    /// Decodes a binary checkpoint produced by [`Snapshot::to_bincode`].
    pub fn from_bincode(bytes: &[u8]) -> PhysicsResult<Self> {
        let (snapshot, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| PhysicsError::Serialization(e.to_string()))?;
        Ok(snapshot)
    }

    /// Rebuilds every body, in id order.
    pub fn bodies(&self) -> impl Iterator<Item = PhysicsBody> + '_ {
        self.objects.iter().map(|(id, record)| record.to_body(id.as_str()))
    }
}
