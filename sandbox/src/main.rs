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

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use khora_agents::physics_agent::{PhysicsAgent, PhysicsSettings};
use khora_core::math::Vec3;
use khora_core::physics::{BodyDesc, CollisionLayers, DebugDrawer};
use khora_data::{Actor, ActorDesc, ActorStore, SimulationRegistry};
use khora_infra::physics::native::{NativePhysicsWorld, SimpleMovementSolver};

/// Simulated render frame duration.
const FRAME_TIME: f32 = 1.0 / 45.0;
const FRAMES: u32 = 270;
const ACTORS: usize = 64;

#[derive(Default)]
struct LineCounter {
    lines: usize,
}

impl DebugDrawer for LineCounter {
    fn draw_lines(&mut self, _vertices: &[Vec3], indices: &[[u32; 2]]) {
        self.lines += indices.len();
    }
}

fn load_settings() -> Result<PhysicsSettings> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(PhysicsSettings {
            worker_threads: 4,
            ..Default::default()
        });
    };
    let source =
        std::fs::read_to_string(&path).with_context(|| format!("reading settings from {path}"))?;
    PhysicsSettings::from_ron_str(&source).with_context(|| format!("parsing settings in {path}"))
}

fn build_level(world: &NativePhysicsWorld) {
    // Floor, and a wall across the walkers' path.
    world.spawn(&BodyDesc::static_box(
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(100.0, 0.5, 100.0),
        CollisionLayers::WORLD,
    ));
    world.spawn(&BodyDesc::static_box(
        Vec3::new(0.0, 2.0, 20.0),
        Vec3::new(30.0, 2.0, 0.5),
        CollisionLayers::WORLD,
    ));
}

fn spawn_crowd(world: &NativePhysicsWorld, actors: &mut ActorStore) -> Vec<Arc<Actor>> {
    (0..ACTORS)
        .map(|i| {
            // Half of them start in the air.
            let height = if i % 2 == 0 { 1.0 } else { 4.0 };
            let position = Vec3::new((i % 8) as f32 * 3.0 - 12.0, height, (i / 8) as f32 * 2.0);
            let desc = ActorDesc {
                name: format!("walker-{i}"),
                position,
                ..Default::default()
            };
            let body = world.spawn(&BodyDesc::actor_box(position, desc.half_extents));
            let actor = actors.spawn(desc, body);
            actor.set_movement(Vec3::new(0.0, 0.0, 1.5 + (i % 3) as f32 * 0.5));
            actor
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let world = Arc::new(NativePhysicsWorld::new());
    build_level(&world);
    let mut actors = ActorStore::new();
    let crowd = spawn_crowd(&world, &mut actors);

    let mut agent = PhysicsAgent::new(
        settings,
        world.clone(),
        Arc::new(SimpleMovementSolver::default()),
    )?;

    let mut accumulator = 0.0;
    let mut landings = 0;
    for frame in 0..FRAMES {
        let frame_start = Instant::now();
        accumulator += FRAME_TIME;

        // Midway through, a storm picks up.
        if frame == FRAMES / 2 {
            log::info!("Sandbox: storm rising");
            agent.set_storm(Some(Vec3::new(2.0, 0.0, 0.0)));
        }

        let registry = SimulationRegistry::from_actors(&actors);
        accumulator = agent.prepare(accumulator, registry, frame_start);

        // Game logic would run here while the frame is pending.
        let seen = crowd
            .iter()
            .skip(1)
            .filter(|other| agent.get_line_of_sight(&crowd[0], other))
            .count();

        agent.sync_simulation();
        for actor in &crowd {
            landings += actor.drain_landings().len();
        }

        if frame % 45 == 0 {
            let stats = agent.stats();
            log::info!(
                "Sandbox: frame {} | {} x {:.4}s | {:.3}ms | {} seen by {} | {} LOS",
                stats.frame_number,
                stats.steps,
                stats.step_delta,
                stats.average_physics_seconds() * 1000.0,
                seen,
                crowd[0].name(),
                stats.los_entries
            );
        }
        std::thread::sleep(Duration::from_secs_f32(FRAME_TIME * 0.25));
    }

    let mut counter = LineCounter::default();
    agent.debug_draw(&mut counter);
    log::info!(
        "Sandbox: done, {landings} landings, {} bodies, {} debug lines, peak frame {:.3}ms",
        world.body_count(),
        counter.lines,
        agent.stats().peak_physics_seconds() * 1000.0
    );
    Ok(())
}
