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

//! Per-step operation budget and the low-power wall-clock throttle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kinex_core::{PhysicsError, PhysicsResult};

/// Operation costs charged against the per-step budget.
pub mod cost {
    /// Integrating one body.
    pub const BODY: u64 = 5;
    /// Applying gravity to one dynamic body.
    pub const GRAVITY: u64 = 3;
    /// Integrating one hinge joint.
    pub const JOINT: u64 = 2;
    /// Propagating one parent link.
    pub const LINK: u64 = 2;
    /// Testing the bounding boxes of one body pair.
    pub const BROAD_PHASE: u64 = 1;
    /// Resolving one pair whose bounding boxes overlap.
    pub const PAIR: u64 = 10;
    /// Testing one body against the ground plane.
    pub const GROUND: u64 = 2;
}

/// A monotonic time source for the low-power throttle.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time, measured from the clock's creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Tracks the operation budget of the current step and decides whether a
/// step may run at all.
#[derive(Debug)]
pub struct Scheduler {
    budget: u64,
    used: u64,
    reserved: u64,
    low_power: bool,
    min_interval: Duration,
    last_run: Option<Duration>,
    clock: Box<dyn Clock>,
    cursor: usize,
    pair_cursor: usize,
    executed_steps: u64,
    total_ops: u64,
}

impl Scheduler {
    /// Creates a scheduler with the given budget and low-power rate.
    pub fn new(budget: u64, low_power: bool, low_power_update_hz: f64) -> Self {
        Self {
            budget,
            used: 0,
            reserved: 0,
            low_power,
            min_interval: interval_for(low_power_update_hz),
            last_run: None,
            clock: Box::new(SystemClock::new()),
            cursor: 0,
            pair_cursor: 0,
            executed_steps: 0,
            total_ops: 0,
        }
    }

    /// Replaces the time source.
    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = clock;
        self.last_run = None;
    }

    /// Enables or disables the low-power throttle.
    pub fn set_low_power(&mut self, enabled: bool) {
        self.low_power = enabled;
    }

    /// Whether the low-power throttle is active.
    pub fn low_power(&self) -> bool {
        self.low_power
    }

    /// Starts a step. Returns `false` if the low-power throttle skips it.
    pub fn begin_step(&mut self) -> bool {
        let now = self.clock.now();
        if self.low_power {
            if let Some(last) = self.last_run {
                if now.saturating_sub(last) < self.min_interval {
                    return false;
                }
            }
        }
        self.last_run = Some(now);
        self.used = 0;
        self.reserved = 0;
        true
    }

    /// Holds `ops` back from [`Scheduler::try_consume`] until
    /// [`Scheduler::release_reserved`]. At most half the budget is ever held.
    pub fn reserve(&mut self, ops: u64) {
        self.reserved = ops.min(self.budget / 2);
    }

    /// Makes the reserved operations available again.
    pub fn release_reserved(&mut self) {
        self.reserved = 0;
    }

    /// Charges `ops` against the unreserved budget, failing without charging
    /// if it would overflow.
    pub fn try_consume(&mut self, ops: u64) -> PhysicsResult<()> {
        let next = self.used.saturating_add(ops);
        if next.saturating_add(self.reserved) > self.budget {
            return Err(PhysicsError::ResourceExhausted {
                used: self.used,
                budget: self.budget,
            });
        }
        self.used = next;
        Ok(())
    }

    /// Closes the current step and folds its usage into the running average.
    pub fn finish_step(&mut self) {
        self.executed_steps += 1;
        self.total_ops = self.total_ops.saturating_add(self.used);
    }

    /// Operations charged in the current or last executed step.
    pub fn ops_used(&self) -> u64 {
        self.used
    }

    /// The per-step budget.
    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Mean operations per executed step.
    pub fn average_ops(&self) -> f64 {
        if self.executed_steps == 0 {
            0.0
        } else {
            self.total_ops as f64 / self.executed_steps as f64
        }
    }

    /// Index of the first body to integrate next step, so deferred bodies go first.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Records where integration stopped.
    pub fn defer_from(&mut self, index: usize) {
        self.cursor = index;
    }

    /// Row of the pair matrix that collision testing starts from next step.
    pub fn pair_cursor(&self) -> usize {
        self.pair_cursor
    }

    /// Records the row where collision testing stopped, or `0` once every
    /// pair has been tested.
    pub fn defer_pairs_from(&mut self, row: usize) {
        self.pair_cursor = row;
    }

    /// Clears usage statistics and the throttle, keeping the clock and budget.
    pub fn reset(&mut self) {
        self.used = 0;
        self.reserved = 0;
        self.last_run = None;
        self.cursor = 0;
        self.pair_cursor = 0;
        self.executed_steps = 0;
        self.total_ops = 0;
    }
}

fn interval_for(hz: f64) -> Duration {
    if hz.is_finite() && hz > 0.0 {
        Duration::from_secs_f64(1.0 / hz)
    } else {
        Duration::ZERO
    }
}
