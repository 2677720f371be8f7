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

//! The per-step result returned by `World::step`.

use kinex_core::physics::CollisionInfo;
use serde::{Deserialize, Serialize};

/// One contact resolved during a step, in the checkpoint-friendly shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    /// First body id.
    pub object1: String,
    /// Second body id, or `"ground"`.
    pub object2: String,
    /// Penetration depth before resolution.
    pub overlap: f64,
    /// Unit normal from `object2` towards `object1`.
    pub normal: [f64; 3],
}

impl From<&CollisionInfo> for CollisionRecord {
    fn from(info: &CollisionInfo) -> Self {
        Self {
            object1: info.body_a.clone(),
            object2: info.body_b.clone(),
            overlap: info.depth,
            normal: info.normal.to_array(),
        }
    }
}

/// What a call to `World::step` did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Bodies integrated this step.
    pub objects_updated: usize,
    /// Contacts resolved this step, pairs first, ground contacts last.
    pub collisions: Vec<CollisionRecord>,
    /// Operations charged against the budget.
    pub ops_used: u64,
    /// `true` when the low-power throttle skipped the step entirely.
    pub skipped: bool,
    /// `true` when the budget ran out and some work was deferred.
    pub partial: bool,
    /// Bodies whose integration was deferred to the next step.
    pub deferred: usize,
    /// Body pairs left untested; the next step starts from them.
    pub deferred_pairs: usize,
}

impl StepReport {
    /// The report of a throttled step.
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
