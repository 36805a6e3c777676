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
use std::time::Instant;

use approx::assert_relative_eq;
use khora_agents::physics_agent::{PhysicsAgent, PhysicsSettings};
use khora_core::math::Vec3;
use khora_core::physics::{
    BodyDesc, CollisionLayers, DebugDrawer, PhysicsProvider, Ray, RayFilter,
};
use khora_core::sync::LockingPolicy;
use khora_data::{Actor, ActorDesc, ActorStore, Projectile, SimulationRegistry};
use khora_infra::physics::native::{NativePhysicsWorld, SimpleMovementSolver};

const DT: f32 = 1.0 / 60.0;
const FRAME: f32 = 0.055;

struct Scene {
    world: Arc<NativePhysicsWorld>,
    actors: ActorStore,
    agent: PhysicsAgent,
}

impl Scene {
    fn new(settings: PhysicsSettings) -> Self {
        let world = Arc::new(NativePhysicsWorld::new());
        world.spawn(&BodyDesc::static_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(100.0, 0.5, 100.0),
            CollisionLayers::WORLD,
        ));
        let agent = PhysicsAgent::new(
            settings,
            world.clone(),
            Arc::new(SimpleMovementSolver::default()),
        )
        .expect("valid settings");
        Self {
            world,
            actors: ActorStore::new(),
            agent,
        }
    }

    fn spawn(&mut self, position: Vec3) -> Arc<Actor> {
        let desc = ActorDesc {
            position,
            ..Default::default()
        };
        let body = self
            .world
            .spawn(&BodyDesc::actor_box(position, desc.half_extents));
        self.actors.spawn(desc, body)
    }

    fn wall(&self, center: Vec3, half_extents: Vec3) {
        self.world
            .spawn(&BodyDesc::static_box(center, half_extents, CollisionLayers::WORLD));
    }

    /// Runs one full frame and returns the simulated time.
    fn frame(&mut self, accumulated: f32) -> f32 {
        let registry = SimulationRegistry::from_actors(&self.actors);
        self.agent.prepare(accumulated, registry, Instant::now());
        let simulated = self.simulated();
        self.agent.sync_simulation();
        simulated
    }

    fn simulated(&self) -> f32 {
        let stats = self.agent.stats();
        stats.steps as f32 * stats.step_delta
    }
}

#[derive(Default)]
struct LineCounter {
    lines: usize,
}

impl DebugDrawer for LineCounter {
    fn draw_lines(&mut self, _vertices: &[Vec3], indices: &[[u32; 2]]) {
        self.lines += indices.len();
    }
}

#[test]
fn test_frame_moves_actors_and_publishes_bodies() {
    // --- 1. ARRANGE ---
    let mut scene = Scene::new(PhysicsSettings::default());
    let walker = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    walker.set_movement(Vec3::new(2.0, 0.0, 0.0));

    // --- 2. ACT ---
    let registry = SimulationRegistry::from_actors(&scene.actors);
    let leftover = scene.agent.prepare(FRAME, registry, Instant::now());
    let simulated = scene.simulated();
    let returned = scene.agent.sync_simulation();

    // --- 3. ASSERT ---
    assert!(scene.agent.stats().steps >= 1);
    assert_relative_eq!(leftover + simulated, FRAME, epsilon = 1e-6);
    assert_relative_eq!(walker.position().x, 2.0 * simulated, epsilon = 1e-4);
    assert_relative_eq!(walker.position().y, 1.0, epsilon = 1e-4);
    assert_eq!(scene.world.body_position(walker.body()), Some(walker.position()));
    assert!(walker.state().on_ground);
    assert_eq!(returned.map(|r| r.len()), Some(1));
    assert!(!scene.agent.has_pending_frame());
    assert!(scene.agent.sync_simulation().is_none(), "nothing left to sync");
}

#[test]
fn test_budget_settles_to_full_rate() {
    let mut scene = Scene::new(PhysicsSettings::default());
    scene.spawn(Vec3::new(0.0, 1.0, 0.0));

    // Budgets start at one step duration per step, which allows a single
    // step; measured frames are far cheaper than that.
    scene.frame(FRAME);
    let first = scene.agent.stats().clone();
    assert_eq!(first.steps, 1);
    assert!(first.step_delta > DT);

    for _ in 0..8 {
        scene.frame(FRAME);
    }
    let settled = scene.agent.stats();
    assert_eq!(settled.steps, 3);
    assert_relative_eq!(settled.step_delta, DT);
}

#[test]
fn test_short_frame_only_interpolates() {
    let mut scene = Scene::new(PhysicsSettings::default());
    let walker = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    walker.set_movement(Vec3::new(2.0, 0.0, 0.0));

    let registry = SimulationRegistry::from_actors(&scene.actors);
    let leftover = scene.agent.prepare(DT * 0.5, registry, Instant::now());
    scene.agent.sync_simulation();

    assert_eq!(scene.agent.stats().steps, 0);
    assert_relative_eq!(leftover, DT * 0.5);
    assert_relative_eq!(scene.agent.interpolation_factor(), 0.5);
    assert_eq!(walker.position(), Vec3::new(0.0, 1.0, 0.0));
}

#[test]
fn test_destroyed_actor_is_skipped() {
    // --- 1. ARRANGE ---
    let mut scene = Scene::new(PhysicsSettings {
        worker_threads: 2,
        ..Default::default()
    });
    let survivor = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    survivor.set_movement(Vec3::new(0.0, 0.0, 1.0));
    let doomed = scene.spawn(Vec3::new(5.0, 1.0, 0.0));
    let registry = SimulationRegistry::from_actors(&scene.actors);

    // Destroyed after the frame's registry was built.
    let doomed_id = doomed.id();
    let doomed_body = doomed.body();
    drop(doomed);
    drop(scene.actors.despawn(doomed_id));
    scene.agent.remove_body(doomed_body);

    // --- 2. ACT ---
    scene.agent.prepare(FRAME, registry, Instant::now());
    let simulated = scene.simulated();
    scene.agent.sync_simulation();

    // --- 3. ASSERT ---
    let stats = scene.agent.stats();
    assert_eq!(stats.simulations, 2);
    assert_eq!(stats.live_simulations, 1);
    assert_relative_eq!(survivor.position().z, simulated, epsilon = 1e-4);
    assert!(scene.world.body_position(doomed_body).is_none());
}

#[test]
fn test_reset_is_idempotent() {
    let mut scene = Scene::new(PhysicsSettings::default());
    let walker = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    walker.set_movement(Vec3::new(1.0, 0.0, 0.0));
    scene.frame(FRAME);

    // A frame in flight is discarded by the reset.
    let registry = SimulationRegistry::from_actors(&scene.actors);
    scene.agent.prepare(FRAME, registry, Instant::now());
    walker.move_by(Vec3::new(0.0, 0.0, 3.0));

    scene.agent.reset_simulation(&scene.actors);
    let once = walker.state().clone();
    scene.agent.reset_simulation(&scene.actors);
    let twice = walker.state().clone();

    assert!(!scene.agent.has_pending_frame());
    assert!(scene.agent.sync_simulation().is_none());
    assert_eq!(once.position, twice.position);
    assert_eq!(twice.previous_position, twice.position);
    assert_eq!(twice.render_position, twice.position);
    assert_eq!(twice.pending_offset, Vec3::ZERO);
    assert_eq!(scene.world.body_position(walker.body()), Some(twice.position));
    assert_eq!(scene.agent.los_cache_len(), 0);

    // Budgets are back to their seed: a single step again.
    scene.frame(FRAME);
    assert_eq!(scene.agent.stats().steps, 1);
}

#[test]
fn test_workers_move_every_actor_alike() {
    for shared_reads in [true, false] {
        let mut scene = Scene::new(PhysicsSettings {
            worker_threads: 4,
            shared_reads,
            ..Default::default()
        });
        let expected_policy = if shared_reads {
            LockingPolicy::AllowSharedLocks
        } else {
            LockingPolicy::ExclusiveLocksOnly
        };
        assert_eq!(scene.agent.locking_policy(), expected_policy);

        let walkers: Vec<_> = (0..32)
            .map(|i| {
                let walker = scene.spawn(Vec3::new(i as f32 * 2.0, 1.0, 0.0));
                walker.set_movement(Vec3::new(0.0, 0.0, 1.5));
                walker
            })
            .collect();

        let mut simulated = 0.0;
        for _ in 0..6 {
            simulated += scene.frame(FRAME);
        }

        for walker in &walkers {
            assert_relative_eq!(walker.position().z, 1.5 * simulated, epsilon = 1e-3);
        }
        assert_eq!(scene.agent.stats().live_simulations, 32);
    }
}

#[test]
fn test_unsynced_frame_is_synced_by_next_prepare() {
    let mut scene = Scene::new(PhysicsSettings::default());
    let walker = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    walker.set_movement(Vec3::new(1.0, 0.0, 0.0));

    let registry = SimulationRegistry::from_actors(&scene.actors);
    scene.agent.prepare(FRAME, registry, Instant::now());
    let first = scene.simulated();

    let registry = SimulationRegistry::from_actors(&scene.actors);
    scene.agent.prepare(FRAME, registry, Instant::now());
    let second = scene.simulated();

    assert_eq!(scene.agent.stats().frame_number, 2);
    assert!(scene.agent.has_pending_frame());
    assert_relative_eq!(walker.position().x, first + second, epsilon = 1e-4);
    assert!(scene.agent.sync_simulation().is_some());
}

#[test]
fn test_line_of_sight_through_agent() {
    // --- 1. ARRANGE ---
    let mut scene = Scene::new(PhysicsSettings {
        los_cache_expiry: 2,
        ..Default::default()
    });
    scene.wall(Vec3::new(5.0, 1.0, 0.0), Vec3::new(0.5, 3.0, 3.0));
    let a = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    let b = scene.spawn(Vec3::new(10.0, 1.0, 0.0));
    let c = scene.spawn(Vec3::new(0.0, 1.0, 10.0));

    // --- 2. ACT & ASSERT ---
    assert!(!scene.agent.get_line_of_sight(&a, &b));
    assert!(!scene.agent.get_line_of_sight(&b, &a));
    assert!(scene.agent.get_line_of_sight(&a, &c));
    assert!(scene.agent.get_line_of_sight(&b, &c));
    assert!(scene.agent.get_line_of_sight(&a, &a));
    assert_eq!(scene.agent.los_cache_len(), 3);

    // Unqueried pairs expire after `los_cache_expiry` refresh passes.
    for _ in 0..2 {
        scene.frame(FRAME);
    }
    assert_eq!(scene.agent.los_cache_len(), 3);
    scene.frame(FRAME);
    assert_eq!(scene.agent.los_cache_len(), 0);
    assert_eq!(scene.agent.stats().los_reaped, 3);
}

#[test]
fn test_landing_is_reported_after_a_fall() {
    let mut scene = Scene::new(PhysicsSettings::default());
    let jumper = scene.spawn(Vec3::new(0.0, 3.0, 0.0));

    let mut landings = Vec::new();
    for _ in 0..60 {
        scene.frame(FRAME);
        landings.extend(jumper.drain_landings());
    }

    assert_eq!(landings.len(), 1);
    assert_relative_eq!(landings[0].height, 2.0, epsilon = 1e-3);
    assert!(jumper.state().on_ground);
    assert_relative_eq!(jumper.position().y, 1.0, epsilon = 1e-4);
}

#[test]
fn test_projectile_stops_at_first_hit() {
    let mut scene = Scene::new(PhysicsSettings::default());
    scene.wall(Vec3::new(5.0, 1.0, 0.0), Vec3::new(0.5, 3.0, 3.0));
    let shooter = scene.spawn(Vec3::new(0.0, 1.0, 0.0));
    let arrow = Arc::new(Projectile::new(
        Vec3::new(0.0, 1.5, 0.0),
        Vec3::new(20.0, 0.0, 0.0),
        CollisionLayers::WORLD | CollisionLayers::ACTOR,
        Some(shooter.body()),
    ));

    for _ in 0..20 {
        let mut registry = SimulationRegistry::from_actors(&scene.actors);
        registry.add_projectile(&arrow);
        scene.agent.prepare(FRAME, registry, Instant::now());
        scene.agent.sync_simulation();
    }

    let hit = arrow.hit().expect("the wall is in the way");
    assert_relative_eq!(hit.point.x, 4.5, epsilon = 1e-4);
    assert_relative_eq!(arrow.position().x, 4.5, epsilon = 1e-4);
}

#[test]
fn test_locked_engine_passthroughs() {
    let scene = Scene::new(PhysicsSettings::default());
    let ray = Ray {
        origin: Vec3::new(0.0, 1.0, 0.0),
        direction: Vec3::X,
    };
    let filter = RayFilter::new(CollisionLayers::DOOR);

    let door = scene.agent.add_body(
        &BodyDesc::static_box(Vec3::new(3.0, 1.0, 0.0), Vec3::ONE, CollisionLayers::DOOR),
        true,
    );
    let hit = scene.agent.ray_test(&ray, 10.0, &filter).unwrap();
    assert_eq!(hit.map(|h| h.body), Some(door));

    scene.agent.remove_body(door);
    assert!(scene.agent.ray_test(&ray, 10.0, &filter).unwrap().is_none());
    assert!(scene.world.lock_body_read(door).is_none());
}

#[test]
fn test_debug_draw_forwards_world_geometry() {
    let mut scene = Scene::new(PhysicsSettings::default());
    scene.spawn(Vec3::new(0.0, 1.0, 0.0));

    let mut counter = LineCounter::default();
    let drawn = scene.agent.debug_draw(&mut counter);

    // Floor and actor, twelve edges each.
    assert_eq!(drawn, 24);
    assert_eq!(counter.lines, 24);
}

#[test]
fn test_invalid_settings_are_fatal() {
    let world = Arc::new(NativePhysicsWorld::new());
    let result = PhysicsAgent::new(
        PhysicsSettings {
            step_duration: -1.0,
            ..Default::default()
        },
        world,
        Arc::new(SimpleMovementSolver::default()),
    );
    assert!(result.is_err());
}
