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

//! # Kinex Sim
//!
//! The deterministic, fixed-timestep [`World`] built on `kinex-core`: body
//! registry, semi-implicit Euler integration, kinematic rider propagation,
//! collision handling, the operation budget and low-power throttle, object
//! pooling, checkpoints and fitness metrics.
//!
//! ```
//! use kinex_core::math::Vec3;
//! use kinex_core::physics::PhysicsBody;
//! use kinex_sim::World;
//!
//! let mut world = World::new();
//! world.add(PhysicsBody::dynamic("box", Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, 1.0));
//! let report = world.step(1.0 / 60.0);
//! assert_eq!(report.objects_updated, 1);
//! assert!(world.body("box").unwrap().position.y < 5.0);
//! ```

#![warn(missing_docs)]

pub mod config;
mod constraints;
pub mod diagnostics;
mod integrator;
pub mod metrics;
pub mod pool;
mod registry;
pub mod report;
pub mod scheduler;
mod sensors;
pub mod snapshot;
mod world;

pub use config::{ExecutionProfile, SimConfig};
pub use diagnostics::{Diagnostics, FaultCounters};
pub use metrics::{BodyState, FitnessMetrics, PhysicsState};
pub use report::{CollisionRecord, StepReport};
pub use scheduler::{Clock, ManualClock, SystemClock};
pub use sensors::ProximityReading;
pub use snapshot::{BodyRecord, Snapshot};
pub use world::World;
