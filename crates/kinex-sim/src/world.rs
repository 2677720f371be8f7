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

//! Defines the `World`, the owner and orchestrator of one simulation.

use kinex_core::math::Vec3;
use kinex_core::physics::{
    BodyType, CollisionDetector, GroundPlane, ImpulseSolver, JointState, PhysicsBody,
};
use kinex_core::{PhysicsError, PhysicsResult};

use crate::config::{ExecutionProfile, SimConfig};
use crate::constraints::ConstraintPropagator;
use crate::diagnostics::Diagnostics;
use crate::integrator::Integrator;
use crate::metrics::{BodyState, FitnessMetrics, PhysicsState};
use crate::pool::ObjectPool;
use crate::registry::BodyRegistry;
use crate::report::{CollisionRecord, StepReport};
use crate::scheduler::{cost, Clock, Scheduler};
use crate::sensors::{self, ProximityReading};
use crate::snapshot::Snapshot;

/// An isolated physics simulation.
///
/// A `World` exclusively owns its bodies; there is no shared state between
/// worlds, so many can be stepped side by side (one per thread if desired).
/// Every per-step fault (unknown ids, non-finite values, degenerate contacts,
/// budget exhaustion) is absorbed and counted in [`Diagnostics`] rather than
/// returned as a panic.
///
/// A step runs, in order: the low-power throttle, integration, kinematic
/// constraint propagation, pairwise collision detection and resolution, and
/// ground contacts.
#[derive(Debug)]
pub struct World {
    config: SimConfig,
    registry: BodyRegistry,
    integrator: Integrator,
    constraints: ConstraintPropagator,
    detector: CollisionDetector,
    solver: ImpulseSolver,
    ground: Option<GroundPlane>,
    scheduler: Scheduler,
    pool: ObjectPool,
    diagnostics: Diagnostics,
    step_count: u64,
    last_collision_count: usize,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Creates an empty world. Out-of-range settings fall back to their defaults.
    pub fn with_config(config: SimConfig) -> Self {
        let config = config.sanitized();
        let ground = config.ground_level.map(|level| GroundPlane {
            level,
            margin: config.ground_margin,
            damping: config.ground_damping,
            sleep_threshold: config.sleep_threshold,
        });

        Self {
            registry: BodyRegistry::default(),
            integrator: Integrator::new(config.gravity),
            constraints: ConstraintPropagator::new(config.follow_margin),
            detector: CollisionDetector::new(config.contact_margin, config.degenerate_overlap),
            solver: ImpulseSolver::new(),
            ground,
            scheduler: Scheduler::new(
                config.max_ops_per_step,
                config.low_power,
                config.low_power_update_hz,
            ),
            pool: ObjectPool::new(config.pool_capacity),
            diagnostics: Diagnostics::new(config.collision_log_capacity),
            step_count: 0,
            last_collision_count: 0,
            config,
        }
    }

    /// Rebuilds a world from a checkpoint.
    pub fn from_snapshot(snapshot: &Snapshot, config: SimConfig) -> Self {
        let mut world = Self::with_config(config);
        for body in snapshot.bodies() {
            world.add(body);
        }
        world.step_count = snapshot.step;
        world
    }

    /// The effective (sanitized) configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replaces the time source of the low-power throttle.
    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.scheduler.set_clock(Box::new(clock));
    }

    // --- Registry ---

    /// Registers a body, replacing any body with the same id.
    ///
    /// A parent link on a non-dynamic body, or onto itself, is dropped.
    pub fn add(&mut self, mut body: PhysicsBody) {
        if let Some(parent_id) = body.parent_id() {
            if !body.body_type.is_dynamic() || parent_id == body.id() {
                log::debug!("Body `{}`: dropping invalid link to `{}`", body.id(), parent_id);
                body.set_parent_id(None);
            }
        }
        self.constraints.forget(body.id());
        if let Some(replaced) = self.registry.insert(body) {
            log::debug!("Body `{}` replaced", replaced.id());
            self.recycle(replaced);
        }
    }

    /// Removes a body, returning `false` if the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        self.try_remove(id).is_ok()
    }

    /// Removes a body and drops every link that points at it.
    pub fn try_remove(&mut self, id: &str) -> PhysicsResult<()> {
        let body = match self.registry.remove(id) {
            Some(body) => body,
            None => return Err(self.invalid_reference(id)),
        };
        self.constraints.forget(id);
        for child in self.registry.as_mut_slice() {
            if child.parent_id() == Some(id) {
                child.set_parent_id(None);
                self.constraints.forget(child.id());
            }
        }
        self.recycle(body);
        Ok(())
    }

    /// Takes a reset body out of the object pool, renamed to `id`.
    ///
    /// Only the [`ExecutionProfile::Embedded`] profile pools removed bodies;
    /// `None` means the caller should construct a fresh one.
    pub fn acquire(&mut self, id: impl Into<String>) -> Option<PhysicsBody> {
        self.pool.get(id)
    }

    /// Looks up a body.
    pub fn body(&self, id: &str) -> Option<&PhysicsBody> {
        self.registry.get(id)
    }

    /// All bodies, in id order.
    pub fn bodies(&self) -> impl Iterator<Item = &PhysicsBody> {
        self.registry.as_slice().iter()
    }

    /// Number of registered bodies.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if no body is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Steps executed so far.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    // --- Caller-driven mutation ---

    /// Adds `force / mass` to a dynamic body's acceleration for the next step.
    ///
    /// Returns `false` for unknown ids, non-dynamic bodies and non-finite forces.
    pub fn apply_force(&mut self, id: &str, force: Vec3) -> bool {
        self.try_apply_force(id, force).is_ok()
    }

    /// Fallible form of [`World::apply_force`].
    pub fn try_apply_force(&mut self, id: &str, force: Vec3) -> PhysicsResult<()> {
        let index = self.index_of(id)?;
        let body = &mut self.registry.as_mut_slice()[index];
        if body.inverse_mass() <= 0.0 {
            return Err(PhysicsError::ImmovableBody(id.to_string()));
        }
        if !force.is_finite() {
            return Err(PhysicsError::NonFiniteValue("force"));
        }
        body.acceleration += force * body.inverse_mass();
        Ok(())
    }

    /// Teleports a body. Returns `false` for unknown ids or a non-finite position.
    pub fn set_position(&mut self, id: &str, position: Vec3) -> bool {
        self.with_finite(id, position, |body, p| body.position = p)
    }

    /// Overrides a body's velocity. Returns `false` for unknown ids or a non-finite velocity.
    pub fn set_velocity(&mut self, id: &str, velocity: Vec3) -> bool {
        self.with_finite(id, velocity, |body, v| body.velocity = v)
    }

    /// Sets a body's mass, clamping it into range. Returns `false` for unknown ids.
    pub fn set_mass(&mut self, id: &str, mass: f64) -> bool {
        !matches!(self.try_set_mass(id, mass), Err(PhysicsError::InvalidReference(_)))
    }

    /// Sets a body's mass.
    ///
    /// A mass that is not strictly positive is still applied, clamped to the
    /// minimum, and reported as [`PhysicsError::ZeroOrNegativeMass`].
    pub fn try_set_mass(&mut self, id: &str, mass: f64) -> PhysicsResult<()> {
        let index = self.index_of(id)?;
        let body = &mut self.registry.as_mut_slice()[index];
        if body.set_mass(mass) {
            log::debug!("Body `{}`: mass {} clamped to {}", id, mass, body.mass());
            self.diagnostics.counters_mut().mass_corrections += 1;
        }
        if mass.is_nan() || mass <= 0.0 {
            return Err(PhysicsError::ZeroOrNegativeMass(mass));
        }
        Ok(())
    }

    /// Sets friction and restitution, clamped to `[0, 1]`. Returns `false` for unknown ids.
    pub fn set_material(&mut self, id: &str, friction: f64, restitution: f64) -> bool {
        match self.index_of(id) {
            Ok(index) => {
                self.registry.as_mut_slice()[index].set_material(friction, restitution);
                true
            }
            Err(_) => false,
        }
    }

    /// Links a dynamic `child` to the kinematic body `parent` it rides on.
    pub fn set_parent(&mut self, child: &str, parent: &str) -> bool {
        self.try_set_parent(child, parent).is_ok()
    }

    /// Fallible form of [`World::set_parent`].
    pub fn try_set_parent(&mut self, child: &str, parent: &str) -> PhysicsResult<()> {
        let parent_index = self.index_of(parent)?;
        let child_index = self.index_of(child)?;
        if parent_index == child_index {
            return Err(PhysicsError::InvalidReference(parent.to_string()));
        }

        let anchor = &self.registry.as_slice()[parent_index];
        if anchor.body_type != BodyType::Kinematic {
            log::debug!("Parent `{}` is not kinematic; the link stays inactive", parent);
        }
        let anchor_position = anchor.position;

        let body = &mut self.registry.as_mut_slice()[child_index];
        if !body.body_type.is_dynamic() {
            return Err(PhysicsError::ImmovableBody(child.to_string()));
        }
        body.set_parent_id(Some(parent.to_string()));
        self.constraints.track(child, anchor_position);
        Ok(())
    }

    /// Drops the parent link of `child`. Returns `false` for unknown ids.
    pub fn clear_parent(&mut self, child: &str) -> bool {
        match self.registry.get_mut(child) {
            Some(body) => {
                body.set_parent_id(None);
                self.constraints.forget(child);
                true
            }
            None => false,
        }
    }

    /// Enables or disables the low-power throttle.
    pub fn set_low_power(&mut self, enabled: bool) {
        self.config.low_power = enabled;
        self.scheduler.set_low_power(enabled);
        log::info!("Low-power mode {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether the low-power throttle is active.
    pub fn low_power(&self) -> bool {
        self.scheduler.low_power()
    }

    /// The rate the world is meant to be stepped at: `low_power_update_hz`
    /// while throttled, `update_hz` otherwise.
    pub fn update_hz(&self) -> f64 {
        if self.scheduler.low_power() {
            self.config.low_power_update_hz
        } else {
            self.config.update_hz
        }
    }

    // --- Simulation ---

    /// Advances the world by `dt` seconds.
    ///
    /// A non-finite or non-positive `dt` is replaced by the configured
    /// default. Under low power the call may return a skipped report without
    /// touching any body.
    pub fn step(&mut self, dt: f64) -> StepReport {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            log::debug!("Unusable timestep {}, using {}", dt, self.config.default_dt);
            self.config.default_dt
        };

        if !self.scheduler.begin_step() {
            self.diagnostics.counters_mut().skipped_steps += 1;
            return StepReport::skipped();
        }

        let mut report = StepReport::default();
        if self.ground.is_some() {
            let dynamic = self.bodies().filter(|b| b.body_type.is_dynamic()).count() as u64;
            self.scheduler.reserve(dynamic * cost::GROUND);
        }
        self.constraints.prime(&self.registry);
        self.integrate(dt, &mut report);

        let links = self.constraints.propagate(&mut self.registry, &mut self.scheduler);
        if links.deferred > 0 {
            report.partial = true;
        }

        self.resolve_pairs(&mut report);
        self.scheduler.release_reserved();
        self.resolve_ground(&mut report);

        report.ops_used = self.scheduler.ops_used();
        if report.partial {
            self.diagnostics.counters_mut().partial_steps += 1;
            log::debug!(
                "Step {}: budget of {} ops exhausted, {} bodies and {} pairs deferred",
                self.step_count,
                self.scheduler.budget(),
                report.deferred,
                report.deferred_pairs
            );
        }
        self.scheduler.finish_step();
        self.step_count += 1;
        self.last_collision_count = report.collisions.len();
        for record in &report.collisions {
            self.diagnostics.record_collision(record.clone());
        }

        report
    }

    /// Advances the world by the configured default timestep.
    pub fn tick(&mut self) -> StepReport {
        self.step(self.config.default_dt)
    }

    fn integrate(&mut self, dt: f64, report: &mut StepReport) {
        let count = self.registry.len();
        if count == 0 {
            return;
        }
        let start = self.scheduler.cursor() % count;

        for offset in 0..count {
            let index = (start + offset) % count;
            let body = &mut self.registry.as_mut_slice()[index];
            if self.scheduler.try_consume(Integrator::cost(body)).is_err() {
                report.deferred = count - offset;
                report.partial = true;
                self.scheduler.defer_from(index);
                self.diagnostics.counters_mut().deferred_bodies += report.deferred as u64;
                break;
            }

            let corrections = self.integrator.integrate(body, dt);
            if corrections > 0 {
                log::debug!("Body `{}`: {} non-finite components restored", body.id(), corrections);
                self.diagnostics.counters_mut().nonfinite_corrections += u64::from(corrections);
            }
            report.objects_updated += 1;
        }
    }

    /// Tests every pair, starting from the row where the previous step ran
    /// out of budget so that no pair is starved.
    fn resolve_pairs(&mut self, report: &mut StepReport) {
        let count = self.registry.len();
        if count < 2 {
            return;
        }
        let total = count * (count - 1) / 2;
        let start = self.scheduler.pair_cursor() % count;
        let mut visited = 0;

        for offset in 0..count {
            let i = (start + offset) % count;
            for j in (i + 1)..count {
                let (a, b) = self.registry.pair_mut(i, j);
                if a.inverse_mass() + b.inverse_mass() <= 0.0 {
                    visited += 1;
                    continue;
                }
                if self.scheduler.try_consume(cost::BROAD_PHASE).is_err() {
                    self.defer_pairs(i, total - visited, report);
                    return;
                }
                if !self.detector.broad_phase(a, b) {
                    visited += 1;
                    continue;
                }
                if self.scheduler.try_consume(cost::PAIR).is_err() {
                    self.defer_pairs(i, total - visited, report);
                    return;
                }
                visited += 1;

                let info = self.detector.narrow_phase(a, b);
                if info.degenerate {
                    self.diagnostics.counters_mut().degenerate_contacts += 1;
                }

                let before = (a.position, a.velocity, b.position, b.velocity);
                let resolved = self.solver.resolve(a, b, &info);
                let finite = a.position.is_finite()
                    && a.velocity.is_finite()
                    && b.position.is_finite()
                    && b.velocity.is_finite();
                if let Err(err) = &resolved {
                    log::debug!("Contact `{}`/`{}`: {}", a.id(), b.id(), err);
                }
                if resolved.is_err() || !finite {
                    (a.position, a.velocity, b.position, b.velocity) = before;
                    self.diagnostics.counters_mut().nonfinite_corrections += 1;
                }

                report.collisions.push(CollisionRecord::from(&info));
            }
        }
        self.scheduler.defer_pairs_from(0);
    }

    fn defer_pairs(&mut self, row: usize, deferred: usize, report: &mut StepReport) {
        self.scheduler.defer_pairs_from(row);
        report.partial = true;
        report.deferred_pairs = deferred;
        self.diagnostics.counters_mut().deferred_pairs += deferred as u64;
    }

    fn resolve_ground(&mut self, report: &mut StepReport) {
        let Some(ground) = self.ground else {
            return;
        };

        let bodies = self.registry.as_mut_slice();
        for index in 0..bodies.len() {
            if !bodies[index].body_type.is_dynamic() {
                continue;
            }
            if self.scheduler.try_consume(cost::GROUND).is_err() {
                let skipped = bodies[index..]
                    .iter()
                    .filter(|b| b.body_type.is_dynamic())
                    .count();
                self.diagnostics.counters_mut().skipped_ground_checks += skipped as u64;
                report.partial = true;
                break;
            }

            let body = &mut bodies[index];
            let Some(info) = self.detector.detect_ground(body, &ground) else {
                continue;
            };
            if info.degenerate {
                self.diagnostics.counters_mut().degenerate_contacts += 1;
            }

            let before = (body.position, body.velocity);
            let resolved = self.solver.resolve_ground(body, &info, &ground);
            if resolved.is_err() || !body.position.is_finite() || !body.velocity.is_finite() {
                (body.position, body.velocity) = before;
                self.diagnostics.counters_mut().nonfinite_corrections += 1;
            }

            report.collisions.push(CollisionRecord::from(&info));
        }
    }

    // --- Observation ---

    /// Captures every body for checkpointing.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.step_count, self.registry.as_slice())
    }

    /// Motion statistics over every body.
    pub fn get_fitness_metrics(&self) -> FitnessMetrics {
        FitnessMetrics::compute(
            self.registry.as_slice(),
            self.config.stability_target_energy,
            self.step_count,
        )
    }

    /// A read-only overview of the world.
    pub fn physics_state(&self) -> PhysicsState {
        PhysicsState {
            object_count: self.registry.len(),
            collision_count: self.last_collision_count,
            average_ops: self.scheduler.average_ops(),
            low_power: self.scheduler.low_power(),
            update_hz: self.update_hz(),
            step_count: self.step_count,
            objects: self
                .bodies()
                .map(|body| (body.id().to_string(), BodyState::from(body)))
                .collect(),
        }
    }

    /// Fault counters and the recent contact log.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The most recent contacts, oldest first.
    pub fn recent_collisions(&self) -> impl Iterator<Item = &CollisionRecord> {
        self.diagnostics.recent_collisions()
    }

    /// Removes every body and clears links, statistics and the pool.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.constraints.clear();
        self.pool.clear();
        self.diagnostics.reset();
        self.scheduler.reset();
        self.step_count = 0;
        self.last_collision_count = 0;
        log::info!("World reset");
    }

    // --- Robot-facing accessors ---

    /// The joint state of a hinge body, or `None` for unknown or jointless bodies.
    pub fn get_joint_state(&self, id: &str) -> Option<JointState> {
        self.registry
            .get(id)
            .filter(|body| body.joint.is_hinge())
            .map(|body| body.joint)
    }

    /// Sets the torque driving a hinge joint until changed.
    pub fn apply_torque(&mut self, id: &str, torque: f64) -> bool {
        self.try_apply_torque(id, torque).is_ok()
    }

    /// Fallible form of [`World::apply_torque`].
    pub fn try_apply_torque(&mut self, id: &str, torque: f64) -> PhysicsResult<()> {
        let index = self.index_of(id)?;
        let joint = &mut self.registry.as_mut_slice()[index].joint;
        if !joint.is_hinge() {
            return Err(PhysicsError::NotAJoint(id.to_string()));
        }
        if !torque.is_finite() {
            return Err(PhysicsError::NonFiniteValue("torque"));
        }
        joint.torque = torque;
        Ok(())
    }

    /// Replaces the angle limits of a hinge joint, clamping its current angle.
    pub fn set_joint_limits(&mut self, id: &str, min: f64, max: f64) -> bool {
        self.try_set_joint_limits(id, min, max).is_ok()
    }

    /// Fallible form of [`World::set_joint_limits`].
    pub fn try_set_joint_limits(&mut self, id: &str, min: f64, max: f64) -> PhysicsResult<()> {
        let index = self.index_of(id)?;
        let joint = &mut self.registry.as_mut_slice()[index].joint;
        if !joint.is_hinge() {
            return Err(PhysicsError::NotAJoint(id.to_string()));
        }
        if min.is_nan() || max.is_nan() || min > max {
            return Err(PhysicsError::InvalidJointLimits { min, max });
        }
        joint.limits = (min, max);
        joint.clamp_to_limits();
        Ok(())
    }

    /// Bodies whose centers are closer than `max_distance` to `id`, nearest first.
    pub fn get_proximity(&self, id: &str, max_distance: f64) -> Vec<ProximityReading> {
        match self.registry.get(id) {
            Some(subject) => sensors::proximity(self.registry.as_slice(), subject, max_distance),
            None => Vec::new(),
        }
    }

    /// Ids of the bodies touching `id`, including `"ground"`.
    pub fn get_contact_state(&self, id: &str) -> Vec<String> {
        match self.registry.get(id) {
            Some(subject) => sensors::contacts(
                self.registry.as_slice(),
                subject,
                self.config.ground_level,
                self.config.contact_margin + self.config.ground_margin,
            ),
            None => Vec::new(),
        }
    }

    // --- Helpers ---

    fn index_of(&mut self, id: &str) -> PhysicsResult<usize> {
        match self.registry.index_of(id) {
            Some(index) => Ok(index),
            None => Err(self.invalid_reference(id)),
        }
    }

    fn invalid_reference(&mut self, id: &str) -> PhysicsError {
        log::debug!("Unknown body id `{}`", id);
        self.diagnostics.counters_mut().invalid_references += 1;
        PhysicsError::InvalidReference(id.to_string())
    }

    fn with_finite(
        &mut self,
        id: &str,
        value: Vec3,
        apply: impl FnOnce(&mut PhysicsBody, Vec3),
    ) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.index_of(id) {
            Ok(index) => {
                apply(&mut self.registry.as_mut_slice()[index], value);
                true
            }
            Err(_) => false,
        }
    }

    fn recycle(&mut self, body: PhysicsBody) {
        if self.config.profile == ExecutionProfile::Embedded && !self.pool.release(body) {
            log::debug!("Object pool full ({} bodies), dropping", self.pool.capacity());
        }
    }
}
