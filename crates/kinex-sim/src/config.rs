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

//! Simulation tunables, loadable from JSON.

use std::path::Path;

use kinex_core::math::Vec3;
use kinex_core::{PhysicsError, PhysicsResult};
use serde::{Deserialize, Serialize};

/// Where the world is expected to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProfile {
    /// Desktop or server: removed bodies are simply dropped.
    #[default]
    Standard,
    /// Memory-constrained target: removed bodies are kept in an object pool.
    Embedded,
}

/// Complete configuration of a [`World`](crate::World).
///
/// Missing JSON fields take their default value, so a config file only needs
/// to name what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Gravitational acceleration applied to dynamic bodies, in m/s².
    pub gravity: Vec3,
    /// Timestep used when `step` receives an unusable `dt`, in seconds.
    pub default_dt: f64,
    /// Height of the ground plane, or `None` for no ground.
    pub ground_level: Option<f64>,
    /// Operation budget per step.
    pub max_ops_per_step: u64,
    /// Whether the low-power wall-clock throttle starts enabled.
    pub low_power: bool,
    /// Update rate while the low-power throttle is off, in Hz.
    pub update_hz: f64,
    /// Update rate enforced by the low-power throttle, in Hz.
    pub low_power_update_hz: f64,
    /// Execution profile.
    pub profile: ExecutionProfile,
    /// Maximum number of pooled bodies under [`ExecutionProfile::Embedded`].
    pub pool_capacity: usize,
    /// Bounding-box growth used to catch resting contact, in meters.
    pub contact_margin: f64,
    /// Clearance kept between a rider and its kinematic anchor, in meters.
    pub follow_margin: f64,
    /// Clearance kept above the ground after correction, in meters.
    pub ground_margin: f64,
    /// Vertical speed under which a grounded body is put to rest, in m/s.
    pub sleep_threshold: f64,
    /// Horizontal damping per ground contact, scaled by friction.
    pub ground_damping: f64,
    /// Penetration depth reported for coincident bodies, in meters.
    pub degenerate_overlap: f64,
    /// Number of collisions kept in the diagnostic log.
    pub collision_log_capacity: usize,
    /// Kinetic energy at which the stability score peaks, in joules.
    pub stability_target_energy: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            default_dt: 1.0 / 60.0,
            ground_level: Some(0.0),
            max_ops_per_step: 10_000,
            low_power: false,
            update_hz: 60.0,
            low_power_update_hz: 30.0,
            profile: ExecutionProfile::Standard,
            pool_capacity: 100,
            contact_margin: 0.01,
            follow_margin: 0.01,
            ground_margin: 0.001,
            sleep_threshold: 0.05,
            ground_damping: 0.1,
            degenerate_overlap: 0.05,
            collision_log_capacity: 256,
            stability_target_energy: 10.0,
        }
    }
}

impl SimConfig {
    /// The default configuration for embedded targets: pooling on, low power on.
    pub fn embedded() -> Self {
        Self {
            profile: ExecutionProfile::Embedded,
            low_power: true,
            ..Self::default()
        }
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json(json: &str) -> PhysicsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PhysicsError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> PhysicsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PhysicsError::Serialization(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> PhysicsResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PhysicsError::Serialization(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| {
            PhysicsError::Serialization(format!("cannot write {}: {}", path.display(), e))
        })
    }

    /// Rejects the first out-of-range field with [`PhysicsError::InvalidConfig`].
    pub fn validate(&self) -> PhysicsResult<()> {
        match self.invalid_fields().first() {
            Some(field) => Err(PhysicsError::InvalidConfig(format!(
                "`{}` is non-finite or out of range",
                field
            ))),
            None => Ok(()),
        }
    }

    /// Returns a copy where every out-of-range field is replaced by its default.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for field in self.invalid_fields() {
            log::warn!("SimConfig: `{}` is out of range, using the default", field);
            match field {
                "gravity" => self.gravity = defaults.gravity,
                "default_dt" => self.default_dt = defaults.default_dt,
                "ground_level" => self.ground_level = defaults.ground_level,
                "max_ops_per_step" => self.max_ops_per_step = defaults.max_ops_per_step,
                "update_hz" => self.update_hz = defaults.update_hz,
                "low_power_update_hz" => self.low_power_update_hz = defaults.low_power_update_hz,
                "contact_margin" => self.contact_margin = defaults.contact_margin,
                "follow_margin" => self.follow_margin = defaults.follow_margin,
                "ground_margin" => self.ground_margin = defaults.ground_margin,
                "sleep_threshold" => self.sleep_threshold = defaults.sleep_threshold,
                "ground_damping" => self.ground_damping = defaults.ground_damping,
                "degenerate_overlap" => self.degenerate_overlap = defaults.degenerate_overlap,
                "stability_target_energy" => {
                    self.stability_target_energy = defaults.stability_target_energy
                }
                _ => {}
            }
        }
        self
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        let checks = [
            ("gravity", self.gravity.is_finite()),
            ("default_dt", positive(self.default_dt)),
            (
                "ground_level",
                !matches!(self.ground_level, Some(level) if !level.is_finite()),
            ),
            ("max_ops_per_step", self.max_ops_per_step > 0),
            ("update_hz", positive(self.update_hz)),
            ("low_power_update_hz", positive(self.low_power_update_hz)),
            ("contact_margin", non_negative(self.contact_margin)),
            ("follow_margin", non_negative(self.follow_margin)),
            ("ground_margin", non_negative(self.ground_margin)),
            ("sleep_threshold", non_negative(self.sleep_threshold)),
            (
                "ground_damping",
                non_negative(self.ground_damping) && self.ground_damping <= 1.0,
            ),
            ("degenerate_overlap", positive(self.degenerate_overlap)),
            (
                "stability_target_energy",
                non_negative(self.stability_target_energy),
            ),
        ];

        checks
            .into_iter()
            .filter_map(|(field, ok)| (!ok).then_some(field))
            .collect()
    }
}
