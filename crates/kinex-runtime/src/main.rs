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

// Command-line driver for Kinex worlds.
// Run with: kinex run --scene scene.json --steps 600

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinex_core::math::Vec3;
use kinex_core::physics::PhysicsBody;
use kinex_sim::{SimConfig, Snapshot, World};

#[derive(Parser)]
#[command(author, version, about = "Steps a deterministic rigid-body world")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Restore a world from a checkpoint and step it.
    Run {
        /// Checkpoint to start from (`.json`, or `.bin` for bincode).
        #[arg(long)]
        scene: PathBuf,
        /// Number of steps to execute.
        #[arg(long, default_value_t = 600)]
        steps: u64,
        /// Timestep in seconds. Defaults to the configured one.
        #[arg(long)]
        dt: Option<f64>,
        /// JSON simulation config.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the final checkpoint.
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
    /// Drop a box onto the ground and report how it settles.
    Demo {
        /// Number of steps to execute.
        #[arg(long, default_value_t = 200)]
        steps: u64,
    },
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Run {
            scene,
            steps,
            dt,
            config,
            checkpoint,
        } => run(&scene, steps, dt, config.as_deref(), checkpoint.as_deref()),
        Command::Demo { steps } => demo(steps),
    }
}

fn run(
    scene: &Path,
    steps: u64,
    dt: Option<f64>,
    config: Option<&Path>,
    checkpoint: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let snapshot = load_snapshot(scene)?;
    log::info!(
        "Loaded {} bodies from {} at step {}",
        snapshot.objects.len(),
        scene.display(),
        snapshot.step
    );

    let mut world = World::from_snapshot(&snapshot, config);
    let dt = dt.unwrap_or(world.config().default_dt);
    log::info!(
        "Nominal rate {} Hz (low power: {}), dt = {}",
        world.update_hz(),
        world.low_power(),
        dt
    );
    simulate(&mut world, steps, dt);

    if let Some(path) = checkpoint {
        save_snapshot(&world.snapshot(), path)?;
        log::info!("Checkpoint written to {}", path.display());
    }
    print_metrics(&world)
}

fn demo(steps: u64) -> Result<()> {
    let mut world = World::new();
    world.add(
        PhysicsBody::dynamic("box", Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, 1.0)
            .with_material(0.5, 0.1),
    );
    simulate(&mut world, steps, 0.016);

    if let Some(body) = world.body("box") {
        log::info!(
            "Box settled at y = {:.4} with vertical speed {:.4}",
            body.position.y,
            body.velocity.y
        );
    }
    print_metrics(&world)
}

fn simulate(world: &mut World, steps: u64, dt: f64) {
    let mut collisions = 0;
    let mut partial = 0;
    for _ in 0..steps {
        let report = world.step(dt);
        collisions += report.collisions.len();
        partial += usize::from(report.partial);
    }
    log::info!(
        "Executed {} steps: {} contacts, {} partial steps",
        steps,
        collisions,
        partial
    );
    let counters = world.diagnostics().counters();
    if counters.nonfinite_corrections > 0 || counters.degenerate_contacts > 0 {
        log::warn!(
            "Absorbed {} non-finite values and {} degenerate contacts",
            counters.nonfinite_corrections,
            counters.degenerate_contacts
        );
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let snapshot = if is_binary(path) {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Snapshot::from_bincode(&bytes)
    } else {
        let json =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Snapshot::from_json(&json)
    };
    snapshot.with_context(|| format!("decoding {}", path.display()))
}

fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let written = if is_binary(path) {
        std::fs::write(path, snapshot.to_bincode()?)
    } else {
        std::fs::write(path, snapshot.to_json()?)
    };
    written.with_context(|| format!("writing {}", path.display()))
}

fn is_binary(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "bin")
}

fn print_metrics(world: &World) -> Result<()> {
    let metrics = world.get_fitness_metrics();
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
