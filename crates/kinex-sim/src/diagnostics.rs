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

//! Counters for every class of corrected fault, plus a bounded contact log.

use std::collections::VecDeque;

use serde::Serialize;

use crate::report::CollisionRecord;

/// Running totals of the non-fatal faults a world has absorbed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaultCounters {
    /// Non-finite position, velocity or joint components restored.
    pub nonfinite_corrections: u64,
    /// Contacts that needed the fallback normal and depth.
    pub degenerate_contacts: u64,
    /// Body integrations pushed to a later step by the budget.
    pub deferred_bodies: u64,
    /// Body pairs left untested by the budget and retried next step.
    pub deferred_pairs: u64,
    /// Ground-plane checks dropped by the budget.
    pub skipped_ground_checks: u64,
    /// Steps that ran out of budget.
    pub partial_steps: u64,
    /// Steps skipped by the low-power throttle.
    pub skipped_steps: u64,
    /// Operations that named an unknown body.
    pub invalid_references: u64,
    /// Mass values that had to be clamped.
    pub mass_corrections: u64,
}

/// Fault counters and recent contacts of a world.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    counters: FaultCounters,
    recent: VecDeque<CollisionRecord>,
    capacity: usize,
}

impl Diagnostics {
    /// Creates empty diagnostics retaining at most `capacity` contacts.
    pub fn new(capacity: usize) -> Self {
        Self {
            counters: FaultCounters::default(),
            recent: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// The fault counters.
    pub fn counters(&self) -> &FaultCounters {
        &self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut FaultCounters {
        &mut self.counters
    }

    /// Appends a contact, evicting the oldest one when full.
    pub fn record_collision(&mut self, record: CollisionRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(record);
    }

    /// Retained contacts, oldest first.
    pub fn recent_collisions(&self) -> impl Iterator<Item = &CollisionRecord> {
        self.recent.iter()
    }

    /// Clears counters and the contact log.
    pub fn reset(&mut self) {
        self.counters = FaultCounters::default();
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(i: usize) -> CollisionRecord {
        CollisionRecord {
            object1: format!("b{}", i),
            object2: "ground".to_string(),
            overlap: 0.0,
            normal: [0.0, 1.0, 0.0],
        }
    }

    #[test]
    fn test_log_is_bounded() {
        let mut diagnostics = Diagnostics::new(3);
        for i in 0..5 {
            diagnostics.record_collision(record(i));
        }
        let ids: Vec<_> = diagnostics
            .recent_collisions()
            .map(|r| r.object1.as_str())
            .collect();
        assert_eq!(ids, ["b2", "b3", "b4"]);

        diagnostics.counters_mut().skipped_steps += 1;
        diagnostics.reset();
        assert_eq!(diagnostics.recent_collisions().count(), 0);
        assert_eq!(diagnostics.counters().skipped_steps, 0);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut diagnostics = Diagnostics::new(0);
        diagnostics.record_collision(record(0));
        assert_eq!(diagnostics.recent_collisions().count(), 0);
    }
}
