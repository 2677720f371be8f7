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

use approx::assert_abs_diff_eq;
use kinex_core::math::Vec3;
use kinex_core::physics::{BodyType, PhysicsBody, MIN_MASS};
use kinex_core::PhysicsError;
use kinex_sim::{ExecutionProfile, SimConfig, Snapshot, World};

const DT: f64 = 0.016;

fn weightless() -> SimConfig {
    SimConfig {
        gravity: Vec3::ZERO,
        ground_level: None,
        ..SimConfig::default()
    }
}

#[test]
fn test_immovable_bodies_ignore_gravity() {
    let mut world = World::new();
    world.add(PhysicsBody::fixed("wall", Vec3::new(0.0, 3.0, 0.0), Vec3::ONE));
    world.add(PhysicsBody::kinematic("lift", Vec3::new(5.0, 3.0, 0.0), Vec3::ONE));

    for _ in 0..500 {
        world.step(DT);
    }

    for id in ["wall", "lift"] {
        let body = world.body(id).unwrap();
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.velocity, Vec3::ZERO);
        assert_eq!(body.position.y, 3.0, "`{}` moved under gravity", id);
    }
}

#[test]
fn test_dynamic_body_pushes_off_static_body_without_moving_it() {
    let mut world = World::with_config(weightless());
    world.add(PhysicsBody::fixed("wall", Vec3::ZERO, Vec3::ONE));
    world.add(
        PhysicsBody::dynamic("ball", Vec3::new(-0.9, 0.0, 0.0), Vec3::ONE, 1.0)
            .with_velocity(Vec3::new(5.0, 0.0, 0.0)),
    );

    let report = world.step(DT);
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(world.body("wall").unwrap().position, Vec3::ZERO);
    assert!(world.body("ball").unwrap().velocity.x < 0.0);
}

#[test]
fn test_head_on_collision_restitution() {
    for restitution in [0.0, 0.25, 0.5, 0.9] {
        let mut world = World::with_config(weightless());
        world.add(
            PhysicsBody::dynamic("a", Vec3::new(-0.45, 0.0, 0.0), Vec3::ONE, 2.0)
                .with_velocity(Vec3::new(3.0, 0.0, 0.0))
                .with_material(0.4, restitution),
        );
        world.add(
            PhysicsBody::dynamic("b", Vec3::new(0.45, 0.0, 0.0), Vec3::ONE, 2.0)
                .with_velocity(Vec3::new(-3.0, 0.0, 0.0))
                .with_material(0.4, restitution),
        );

        let pre = world.body("a").unwrap().velocity.x - world.body("b").unwrap().velocity.x;
        world.step(0.001);
        let post = world.body("a").unwrap().velocity.x - world.body("b").unwrap().velocity.x;

        assert_abs_diff_eq!(post, -restitution * pre, epsilon = 1e-3);
    }
}

#[test]
fn test_mass_is_always_positive() {
    let mut world = World::new();
    for (i, mass) in [0.0, -1.0, f64::NAN, f64::NEG_INFINITY, 1e-12].into_iter().enumerate() {
        let id = format!("body{}", i);
        world.add(PhysicsBody::dynamic(id.as_str(), Vec3::ZERO, Vec3::ONE, mass));
        assert!(world.body(&id).unwrap().mass() > 0.0);
    }

    assert_eq!(
        world.try_set_mass("body0", -5.0),
        Err(PhysicsError::ZeroOrNegativeMass(-5.0))
    );
    assert_eq!(world.body("body0").unwrap().mass(), MIN_MASS);
    assert!(world.set_mass("body1", 0.0));
    assert!(world.body("body1").unwrap().mass() > 0.0);
    assert!(!world.set_mass("missing", 1.0));
    assert_eq!(world.diagnostics().counters().mass_corrections, 2);
}

#[test]
fn test_rider_follows_kinematic_anchor() {
    let mut world = World::new();
    world.add(PhysicsBody::kinematic(
        "anchor",
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(1.0, 0.5, 1.0),
    ));
    world.add(PhysicsBody::dynamic(
        "rider",
        Vec3::new(0.0, 5.51, 0.0),
        Vec3::new(0.5, 0.5, 0.5),
        1.0,
    ));
    assert!(world.set_parent("rider", "anchor"));

    for _ in 0..10 {
        world.step(DT);
    }
    let y = world.body("rider").unwrap().position.y;
    assert!((5.5..=5.52).contains(&y), "rider sank to {}", y);

    assert!(world.set_position("anchor", Vec3::new(2.0, 5.0, 0.0)));
    for _ in 0..10 {
        world.step(DT);
        let rider = world.body("rider").unwrap();
        assert!((5.5..=5.52).contains(&rider.position.y), "rider at {}", rider.position.y);
    }
    assert_abs_diff_eq!(world.body("rider").unwrap().position.x, 2.0, epsilon = 1e-9);
}

#[test]
fn test_rider_follows_moving_anchor() {
    let mut world = World::new();
    world.add(
        PhysicsBody::kinematic("belt", Vec3::new(0.0, 1.0, 0.0), Vec3::new(4.0, 0.5, 4.0))
            .with_velocity(Vec3::new(0.5, 0.0, -0.25)),
    );
    world.add(
        PhysicsBody::dynamic("parcel", Vec3::new(0.0, 1.51, 0.0), Vec3::new(0.5, 0.5, 0.5), 2.0)
            .with_parent("belt"),
    );

    for _ in 0..100 {
        world.step(DT);
    }
    let belt = world.body("belt").unwrap().position;
    let parcel = world.body("parcel").unwrap().position;
    assert_abs_diff_eq!(parcel.x, belt.x, epsilon = 1e-9);
    assert_abs_diff_eq!(parcel.z, belt.z, epsilon = 1e-9);
}

#[test]
fn test_removing_anchor_invalidates_links() {
    let mut world = World::new();
    world.add(PhysicsBody::kinematic("anchor", Vec3::new(0.0, 5.0, 0.0), Vec3::ONE));
    world.add(PhysicsBody::dynamic("rider", Vec3::new(0.0, 6.0, 0.0), Vec3::ONE, 1.0));
    assert!(world.set_parent("rider", "anchor"));
    assert!(!world.set_parent("rider", "rider"));
    assert!(!world.set_parent("anchor", "rider"));
    assert!(!world.set_parent("ghost", "anchor"));

    assert!(world.remove("anchor"));
    assert!(!world.remove("anchor"));
    assert!(world.body("rider").unwrap().parent_id().is_none());
    world.step(DT);
    assert!(world.body("rider").unwrap().position.y < 6.0);
}

#[test]
fn test_pooled_body_is_reset_on_reuse() {
    let config = SimConfig {
        profile: ExecutionProfile::Embedded,
        ..weightless()
    };
    let mut world = World::with_config(config);
    world.add(
        PhysicsBody::robot_arm("arm", Vec3::new(0.0, 1.0, 0.0))
            .with_velocity(Vec3::new(1.0, 2.0, 3.0)),
    );
    assert!(world.apply_torque("arm", 4.0));
    world.step(DT);
    assert!(world.apply_force("arm", Vec3::new(10.0, 0.0, 0.0)));

    assert!(world.remove("arm"));
    let reused = world.acquire("arm").expect("removed body should be pooled");
    assert_eq!(reused.velocity, Vec3::ZERO);
    assert_eq!(reused.acceleration, Vec3::ZERO);
    assert_eq!(reused.joint.torque, 0.0);
    world.add(reused);

    let arm = world.body("arm").unwrap();
    assert_eq!(arm.velocity, Vec3::ZERO);
    assert_eq!(arm.acceleration, Vec3::ZERO);
    assert_eq!(arm.joint.torque, 0.0);
    assert!(world.acquire("other").is_none());
}

#[test]
fn test_standard_profile_does_not_pool() {
    let mut world = World::new();
    world.add(PhysicsBody::dynamic("a", Vec3::ZERO, Vec3::ONE, 1.0));
    assert!(world.remove("a"));
    assert!(world.acquire("a").is_none());
}

fn populated_world() -> World {
    let mut world = World::new();
    world.add(
        PhysicsBody::kinematic("platform", Vec3::new(3.0, 1.0, 0.0), Vec3::new(2.0, 0.5, 2.0))
            .with_velocity(Vec3::new(0.2, 0.0, 0.0)),
    );
    world.add(
        PhysicsBody::dynamic("rider", Vec3::new(3.0, 1.51, 0.0), Vec3::new(0.5, 0.5, 0.5), 1.0)
            .with_parent("platform"),
    );
    world.add(
        PhysicsBody::dynamic("crate", Vec3::new(0.0, 4.0, 0.0), Vec3::ONE, 3.0)
            .with_velocity(Vec3::new(0.5, 0.0, 0.1))
            .with_material(0.6, 0.3),
    );
    world.add(
        PhysicsBody::dynamic("ball", Vec3::new(0.2, 6.0, 0.1), Vec3::new(0.4, 0.4, 0.4), 0.5)
            .with_material(0.2, 0.8),
    );
    world.add(PhysicsBody::robot_arm("arm", Vec3::new(-2.0, 0.151, 0.0)));
    world.add(PhysicsBody::mobile_robot("base", Vec3::new(-4.0, 0.151, 1.0)));
    world.add(PhysicsBody::fixed("pillar", Vec3::new(-1.0, 1.0, -1.0), Vec3::new(0.5, 2.0, 0.5)));
    world
}

#[test]
fn test_snapshot_round_trip_matches_next_step() {
    let mut original = populated_world();
    assert!(original.apply_torque("arm", 1.5));
    for _ in 0..60 {
        original.step(DT);
    }

    let json = original.snapshot().to_json().unwrap();
    let snapshot = Snapshot::from_json(&json).unwrap();
    assert_eq!(snapshot.step, 60);
    let mut restored = World::from_snapshot(&snapshot, SimConfig::default());
    assert_eq!(restored.step_count(), 60);
    assert_eq!(restored.len(), original.len());

    original.step(DT);
    restored.step(DT);

    for body in original.bodies() {
        let twin = restored.body(body.id()).unwrap();
        assert_abs_diff_eq!(body.position, twin.position, epsilon = 1e-4);
        assert_abs_diff_eq!(body.velocity, twin.velocity, epsilon = 1e-4);
    }
}

#[test]
fn test_bincode_snapshot_restores_world() {
    let mut world = populated_world();
    for _ in 0..10 {
        world.step(DT);
    }
    let bytes = world.snapshot().to_bincode().unwrap();
    let snapshot = Snapshot::from_bincode(&bytes).unwrap();
    let restored = World::from_snapshot(&snapshot, SimConfig::default());
    assert_eq!(restored.snapshot(), world.snapshot());
}

#[test]
fn test_dropped_box_settles_on_ground() {
    let mut world = World::new();
    world.add(
        PhysicsBody::dynamic("box", Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, 1.0)
            .with_material(0.5, 0.1),
    );

    for _ in 0..200 {
        world.step(DT);
    }

    let body = world.body("box").unwrap();
    assert!(body.velocity.y.abs() < 0.1, "still moving: {}", body.velocity.y);
    assert!(
        (0.5..=0.55).contains(&body.position.y),
        "resting at {}",
        body.position.y
    );
    assert_eq!(world.get_contact_state("box"), ["ground"]);
}

#[test]
fn test_budget_defers_bodies_without_corrupting_them() {
    let config = SimConfig {
        max_ops_per_step: 26,
        ..SimConfig::default()
    };
    let mut world = World::with_config(config);
    for (i, id) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
        world.add(PhysicsBody::dynamic(id, Vec3::new(i as f64 * 10.0, 5.0, 0.0), Vec3::ONE, 1.0));
    }

    let report = world.step(DT);
    assert!(report.partial);
    assert!(!report.skipped);
    assert!(report.ops_used <= 26);
    assert_eq!(report.objects_updated, 2);
    assert_eq!(report.deferred, 3);
    assert_eq!(report.deferred_pairs, 10);
    assert_eq!(world.body("c").unwrap().position.y, 5.0);
    assert!(world.body("a").unwrap().position.y < 5.0);

    let report = world.step(DT);
    assert_eq!(report.objects_updated, 2);
    assert!(world.body("c").unwrap().position.y < 5.0);
    assert!(world.body("d").unwrap().position.y < 5.0);
    assert_eq!(world.body("e").unwrap().position.y, 5.0);

    let counters = world.diagnostics().counters();
    assert_eq!(counters.partial_steps, 2);
    assert_eq!(counters.deferred_bodies, 6);
    assert_eq!(counters.deferred_pairs, 20);
    assert_eq!(counters.skipped_ground_checks, 0);
    assert!(world.bodies().all(|b| b.position.is_finite() && b.velocity.is_finite()));
}

#[test]
fn test_large_world_lands_every_body_on_the_ground() {
    let mut world = World::new();
    for i in 0..50 {
        world.add(PhysicsBody::dynamic(
            format!("cube{:02}", i),
            Vec3::new(i as f64 * 3.0, 2.0, 0.0),
            Vec3::ONE,
            1.0,
        ));
    }

    for _ in 0..200 {
        let report = world.step(DT);
        assert!(!report.partial, "budget exhausted with {} ops", report.ops_used);
    }

    let lowest = world
        .bodies()
        .map(|b| b.position.y)
        .fold(f64::INFINITY, f64::min);
    assert!(lowest >= 0.49, "a cube sank to {}", lowest);
    let counters = world.diagnostics().counters();
    assert_eq!(counters.deferred_pairs, 0);
    assert_eq!(counters.skipped_ground_checks, 0);
}

#[test]
fn test_pair_budget_rotates_and_spares_the_ground() {
    let config = SimConfig {
        max_ops_per_step: 130,
        ..SimConfig::default()
    };
    let mut world = World::with_config(config);
    for i in 0..10 {
        world.add(PhysicsBody::dynamic(
            format!("n{}", i),
            Vec3::new(i as f64, 0.501, 0.0),
            Vec3::ONE,
            1.0,
        ));
    }

    let mut tail_pair_tested = false;
    for _ in 0..60 {
        let report = world.step(DT);
        assert!(report.partial);
        assert!(report.deferred_pairs > 0);
        assert_eq!(report.deferred, 0);
        tail_pair_tested |= report
            .collisions
            .iter()
            .any(|c| c.object1 == "n8" && c.object2 == "n9");
    }

    assert!(tail_pair_tested, "the last pair was never reached");
    assert!(world.bodies().all(|b| b.position.y >= 0.49));
    assert_eq!(world.diagnostics().counters().skipped_ground_checks, 0);
}

#[test]
fn test_fitness_metrics() {
    let mut world = World::with_config(weightless());
    assert_eq!(world.get_fitness_metrics().average_velocity, 0.0);

    world.add(
        PhysicsBody::dynamic("a", Vec3::ZERO, Vec3::ONE, 2.0)
            .with_velocity(Vec3::new(3.0, 4.0, 0.0)),
    );
    world.add(PhysicsBody::fixed("b", Vec3::new(10.0, 0.0, 0.0), Vec3::ONE));
    let metrics = world.get_fitness_metrics();
    assert_abs_diff_eq!(metrics.total_kinetic_energy, 25.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.average_velocity, 2.5, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.max_velocity, 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.stability, 1.0 / 16.0, epsilon = 1e-12);
}

#[test]
fn test_apply_force() {
    let mut world = World::with_config(weightless());
    world.add(PhysicsBody::dynamic("cart", Vec3::ZERO, Vec3::ONE, 2.0));
    world.add(PhysicsBody::fixed("wall", Vec3::new(5.0, 0.0, 0.0), Vec3::ONE));

    assert!(world.apply_force("cart", Vec3::new(10.0, 0.0, 0.0)));
    assert!(!world.apply_force("wall", Vec3::new(10.0, 0.0, 0.0)));
    assert!(!world.apply_force("ghost", Vec3::new(10.0, 0.0, 0.0)));
    assert!(!world.apply_force("cart", Vec3::new(f64::NAN, 0.0, 0.0)));
    assert_eq!(
        world.try_apply_force("wall", Vec3::X),
        Err(PhysicsError::ImmovableBody("wall".to_string()))
    );

    world.step(0.1);
    assert_abs_diff_eq!(world.body("cart").unwrap().velocity.x, 0.5, epsilon = 1e-12);
    assert_eq!(world.body("wall").unwrap().position, Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(world.diagnostics().counters().invalid_references, 1);
}

#[test]
fn test_unusable_timestep_falls_back_to_default() {
    let mut world = World::with_config(weightless());
    world.add(PhysicsBody::dynamic("a", Vec3::ZERO, Vec3::ONE, 1.0).with_velocity(Vec3::X));
    world.step(f64::NAN);
    world.step(-1.0);
    assert_abs_diff_eq!(world.body("a").unwrap().position.x, 2.0 / 60.0, epsilon = 1e-12);
    assert_eq!(world.step_count(), 2);
}

#[test]
fn test_independent_worlds() {
    let mut first = populated_world();
    let second = populated_world();
    for _ in 0..30 {
        first.step(DT);
    }
    assert_eq!(second.step_count(), 0);
    assert_ne!(first.snapshot(), second.snapshot());
}

#[test]
fn test_reset_clears_everything() {
    let mut world = populated_world();
    for _ in 0..5 {
        world.step(DT);
    }
    world.reset();
    assert!(world.is_empty());
    assert_eq!(world.step_count(), 0);
    assert_eq!(world.recent_collisions().count(), 0);
    assert_eq!(world.physics_state().average_ops, 0.0);
}

#[test]
fn test_physics_state_summary() {
    let mut world = World::new();
    world.add(PhysicsBody::robot_arm("arm", Vec3::new(0.0, 0.1, 0.0)));
    world.add(PhysicsBody::kinematic("lift", Vec3::new(4.0, 1.0, 0.0), Vec3::ONE));
    world.step(DT);

    let state = world.physics_state();
    assert_eq!(state.object_count, 2);
    assert_eq!(state.step_count, 1);
    assert_eq!(state.collision_count, 1);
    assert!(state.average_ops > 0.0);
    assert!(!state.low_power);
    assert_eq!(state.update_hz, 60.0);
    assert_eq!(state.objects["lift"].body_type, BodyType::Kinematic);
    assert_eq!(world.recent_collisions().next().unwrap().object2, "ground");
}

#[test]
fn test_sample_scene_runs() {
    let json = include_str!("../../kinex-runtime/scenes/conveyor.json");
    let snapshot = Snapshot::from_json(json).unwrap();
    let mut world = World::from_snapshot(&snapshot, SimConfig::default());
    assert_eq!(world.body("parcel").unwrap().parent_id(), Some("belt"));
    assert!(world.get_joint_state("arm").is_some());

    for _ in 0..300 {
        world.tick();
    }
    let belt = world.body("belt").unwrap().position;
    let parcel = world.body("parcel").unwrap().position;
    assert_abs_diff_eq!(parcel.x, belt.x, epsilon = 1e-9);
    assert_eq!(world.get_joint_state("arm").unwrap().angle, 1.57);
}
