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

//! Simulated proximity and touch sensing.

use kinex_core::physics::{PhysicsBody, GROUND_ID};
use serde::{Deserialize, Serialize};

/// A body seen by a proximity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityReading {
    /// Id of the detected body.
    pub id: String,
    /// Center-to-center distance.
    pub distance: f64,
    /// Detected body position minus the querying body position.
    pub relative_position: [f64; 3],
}

/// Bodies whose centers lie strictly closer than `max_distance` to `subject`,
/// nearest first.
pub(crate) fn proximity(
    bodies: &[PhysicsBody],
    subject: &PhysicsBody,
    max_distance: f64,
) -> Vec<ProximityReading> {
    let mut readings: Vec<_> = bodies
        .iter()
        .filter(|other| other.id() != subject.id())
        .filter_map(|other| {
            let offset = other.position - subject.position;
            let distance = offset.length();
            (distance.is_finite() && distance < max_distance).then(|| ProximityReading {
                id: other.id().to_string(),
                distance,
                relative_position: offset.to_array(),
            })
        })
        .collect();
    // Stable, so equal distances keep id order.
    readings.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    readings
}

/// Ids of the bodies touching `subject`, followed by [`GROUND_ID`] when it
/// rests on the ground plane.
pub(crate) fn contacts(
    bodies: &[PhysicsBody],
    subject: &PhysicsBody,
    ground_level: Option<f64>,
    tolerance: f64,
) -> Vec<String> {
    let mut touching: Vec<String> = bodies
        .iter()
        .filter(|other| other.id() != subject.id())
        .filter(|other| {
            let distance = subject.position.distance(other.position);
            distance < subject.radius() + other.radius() + tolerance
        })
        .map(|other| other.id().to_string())
        .collect();

    if let Some(level) = ground_level {
        if subject.bottom() <= level + tolerance {
            touching.push(GROUND_ID.to_string());
        }
    }
    touching
}
