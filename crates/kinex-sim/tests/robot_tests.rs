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

use std::time::Duration;

use approx::assert_abs_diff_eq;
use kinex_core::math::Vec3;
use kinex_core::physics::{JointType, PhysicsBody};
use kinex_core::PhysicsError;
use kinex_sim::{ManualClock, SimConfig, World};

const DT: f64 = 1.0 / 60.0;

#[test]
fn test_low_power_skips_steps_until_interval_elapses() {
    let clock = ManualClock::new();
    let mut world = World::with_config(SimConfig::embedded());
    world.set_clock(clock.clone());
    world.add(PhysicsBody::dynamic("bot", Vec3::new(0.0, 3.0, 0.0), Vec3::ONE, 1.0));

    assert!(!world.step(DT).skipped);
    let y = world.body("bot").unwrap().position.y;

    clock.advance(Duration::from_millis(20));
    let report = world.step(DT);
    assert!(report.skipped);
    assert_eq!(report.objects_updated, 0);
    assert_eq!(world.body("bot").unwrap().position.y, y);

    clock.advance(Duration::from_millis(15));
    assert!(!world.step(DT).skipped);
    assert!(world.body("bot").unwrap().position.y < y);

    assert_eq!(world.update_hz(), 30.0);
    world.set_low_power(false);
    assert!(!world.low_power());
    assert_eq!(world.update_hz(), 60.0);
    assert!(!world.step(DT).skipped);
    assert_eq!(world.step_count(), 3);
    assert_eq!(world.diagnostics().counters().skipped_steps, 1);
}

#[test]
fn test_hinge_torque_and_limits() {
    let mut world = World::new();
    world.add(PhysicsBody::robot_arm("elbow", Vec3::new(0.0, 2.0, 0.0)));
    world.add(PhysicsBody::mobile_robot("base", Vec3::new(3.0, 0.151, 0.0)));

    assert!(world.get_joint_state("base").is_none());
    assert!(world.get_joint_state("ghost").is_none());
    assert!(!world.apply_torque("base", 1.0));
    assert_eq!(
        world.try_apply_torque("base", 1.0),
        Err(PhysicsError::NotAJoint("base".to_string()))
    );

    assert!(world.set_joint_limits("elbow", -0.2, 0.2));
    assert!(world.apply_torque("elbow", 3.0));
    world.step(0.1);
    let joint = world.get_joint_state("elbow").unwrap();
    assert_eq!(joint.joint_type, JointType::Hinge);
    assert_abs_diff_eq!(joint.angular_velocity, 0.3, epsilon = 1e-12);
    assert_abs_diff_eq!(joint.angle, 0.03, epsilon = 1e-12);

    for _ in 0..20 {
        world.step(0.1);
    }
    let joint = world.get_joint_state("elbow").unwrap();
    assert_eq!(joint.angle, 0.2);
    assert_eq!(joint.torque, 3.0);

    assert!(!world.set_joint_limits("elbow", 1.0, -1.0));
    assert!(!world.set_joint_limits("elbow", f64::NAN, 1.0));
    assert_eq!(
        world.try_set_joint_limits("elbow", 0.5, 0.1),
        Err(PhysicsError::InvalidJointLimits { min: 0.5, max: 0.1 })
    );
    assert!(world.set_joint_limits("elbow", -0.1, 0.1));
    assert_eq!(world.get_joint_state("elbow").unwrap().angle, 0.1);
}

#[test]
fn test_proximity_sensing() {
    let mut world = World::with_config(SimConfig {
        gravity: Vec3::ZERO,
        ..SimConfig::default()
    });
    world.add(PhysicsBody::mobile_robot("rover", Vec3::new(0.0, 1.0, 0.0)));
    world.add(PhysicsBody::fixed("rock", Vec3::new(2.0, 1.0, 0.0), Vec3::ONE));
    world.add(PhysicsBody::fixed("tree", Vec3::new(0.0, 1.0, -1.5), Vec3::ONE));
    world.add(PhysicsBody::fixed("hill", Vec3::new(10.0, 1.0, 0.0), Vec3::ONE));

    let readings = world.get_proximity("rover", 3.0);
    let ids: Vec<_> = readings.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["tree", "rock"]);
    assert_eq!(readings[0].relative_position, [0.0, 0.0, -1.5]);
    assert_abs_diff_eq!(readings[1].distance, 2.0, epsilon = 1e-12);

    assert!(world.get_proximity("rover", 2.0).iter().all(|r| r.id != "rock"));
    assert!(world.get_proximity("ghost", 100.0).is_empty());
}

#[test]
fn test_contact_state() {
    let mut world = World::new();
    world.add(PhysicsBody::dynamic("left", Vec3::new(0.0, 0.501, 0.0), Vec3::ONE, 1.0));
    world.add(PhysicsBody::dynamic("right", Vec3::new(1.0, 0.501, 0.0), Vec3::ONE, 1.0));
    world.add(PhysicsBody::dynamic("flyer", Vec3::new(0.0, 8.0, 0.0), Vec3::ONE, 1.0));

    assert_eq!(world.get_contact_state("left"), ["right", "ground"]);
    assert!(world.get_contact_state("flyer").is_empty());
    assert!(world.get_contact_state("ghost").is_empty());
}

#[test]
fn test_caller_mutation_between_steps() {
    let mut world = World::new();
    world.add(PhysicsBody::dynamic("a", Vec3::new(0.0, 2.0, 0.0), Vec3::ONE, 1.0));

    assert!(world.set_velocity("a", Vec3::new(1.0, 0.0, 0.0)));
    assert!(!world.set_velocity("a", Vec3::new(f64::INFINITY, 0.0, 0.0)));
    assert!(!world.set_position("ghost", Vec3::ZERO));
    assert!(world.set_material("a", 2.0, -1.0));
    assert!(!world.set_material("ghost", 0.5, 0.5));

    let body = world.body("a").unwrap();
    assert_eq!(body.velocity, Vec3::X);
    assert_eq!(body.friction(), 1.0);
    assert_eq!(body.restitution(), 0.0);
}

#[test]
fn test_invalid_config_is_sanitized() {
    let world = World::with_config(SimConfig {
        default_dt: 0.0,
        max_ops_per_step: 0,
        ..SimConfig::default()
    });
    assert_eq!(world.config().default_dt, 1.0 / 60.0);
    assert_eq!(world.config().max_ops_per_step, 10_000);
}
