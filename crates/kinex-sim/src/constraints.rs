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

//! Kinematic parent-child propagation.

use std::collections::BTreeMap;

use kinex_core::math::Vec3;
use kinex_core::physics::BodyType;

use crate::registry::BodyRegistry;
use crate::scheduler::{cost, Scheduler};

/// Counters from one propagation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkPass {
    /// Riders that were moved with their anchor.
    pub followed: usize,
    /// Links whose parent is missing or not kinematic.
    pub stale: usize,
    /// Links left for the next step because the budget ran out.
    pub deferred: usize,
}

/// Moves dynamic riders along with the kinematic body they rest on.
///
/// Links live on the child as a parent id and are resolved through the
/// registry on every pass. For each link the propagator remembers where the
/// anchor was when the rider last followed it; the rider is shifted laterally
/// by the anchor's displacement since then and snapped onto its top face.
#[derive(Debug, Clone, Default)]
pub struct ConstraintPropagator {
    anchors: BTreeMap<String, Vec3>,
    follow_margin: f64,
}

impl ConstraintPropagator {
    /// Creates a propagator keeping `follow_margin` between rider and anchor.
    pub fn new(follow_margin: f64) -> Self {
        Self {
            anchors: BTreeMap::new(),
            follow_margin,
        }
    }

    /// Starts tracking every link that has no remembered anchor position yet.
    ///
    /// Called before integration so an anchor's first movement is seen as a
    /// displacement.
    pub fn prime(&mut self, registry: &BodyRegistry) {
        for child in registry.as_slice() {
            let Some(parent_id) = child.parent_id() else {
                continue;
            };
            if self.anchors.contains_key(child.id()) {
                continue;
            }
            if let Some(parent) = registry.get(parent_id) {
                self.anchors.insert(child.id().to_string(), parent.position);
            }
        }
    }

    /// Starts tracking `child_id` from the anchor's current position.
    pub fn track(&mut self, child_id: &str, anchor_position: Vec3) {
        self.anchors.insert(child_id.to_string(), anchor_position);
    }

    /// Forgets the remembered anchor position of `child_id`.
    pub fn forget(&mut self, child_id: &str) {
        self.anchors.remove(child_id);
    }

    /// Forgets every link.
    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    /// Runs one propagation pass.
    pub fn propagate(
        &mut self,
        registry: &mut BodyRegistry,
        scheduler: &mut Scheduler,
    ) -> LinkPass {
        let mut pass = LinkPass::default();

        for i in 0..registry.len() {
            let child = &registry.as_slice()[i];
            let Some(parent_id) = child.parent_id() else {
                continue;
            };
            let parent = match registry.get(parent_id) {
                Some(parent)
                    if parent.body_type == BodyType::Kinematic && child.body_type.is_dynamic() =>
                {
                    parent
                }
                _ => {
                    log::trace!("Link `{}` -> `{}` is stale, ignoring", child.id(), parent_id);
                    pass.stale += 1;
                    continue;
                }
            };

            if scheduler.try_consume(cost::LINK).is_err() {
                pass.deferred += 1;
                continue;
            }

            let anchor_position = parent.position;
            let anchor_top = parent.top();
            let anchor_vy = parent.velocity.y;
            let half_height = child.half_extents().y;
            let riding = child.bottom() >= anchor_top - half_height;

            if !self.anchors.contains_key(child.id()) {
                self.anchors.insert(child.id().to_string(), anchor_position);
            }
            let displacement = self
                .anchors
                .get_mut(child.id())
                .map(|last| {
                    let moved = anchor_position - *last;
                    *last = anchor_position;
                    moved
                })
                .unwrap_or(Vec3::ZERO);

            if !riding || !displacement.is_finite() {
                continue;
            }

            let child = &mut registry.as_mut_slice()[i];
            child.position.x += displacement.x;
            child.position.z += displacement.z;
            child.position.y = anchor_top + half_height + self.follow_margin;
            child.velocity.y = anchor_vy;
            pass.followed += 1;
        }

        pass
    }
}
