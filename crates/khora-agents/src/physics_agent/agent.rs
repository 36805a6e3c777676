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

//! The physics task scheduler.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use khora_control::{plan_steps, BudgetEstimator, StepPlan};
use khora_core::jobs::JobSystem;
use khora_core::lane::describe_lanes;
use khora_core::math::{saturate, Vec3};
use khora_core::physics::{
    BodyDesc, BodyHandle, DebugDrawer, MovementSolver, PhysicsProvider, Ray, RayFilter,
    RaycastError, RaycastHit, WorldFrameData,
};
use khora_core::sync::{LockingPolicy, PolicyLock};
use khora_core::Stopwatch;
use khora_data::actor::store::ActorStore;
use khora_data::actor::Actor;
use khora_data::simulation::SimulationRegistry;
use khora_lanes::physics_lane::visitors::{InitPositionVisitor, SyncVisitor};
use khora_lanes::physics_lane::{ActorMovementLane, PhysicsDebugLane, StepContext};
use khora_lanes::visibility_lane::LineOfSightLane;

use super::{PhysicsFrameStats, PhysicsSettings};

/// A simulated frame waiting for [`PhysicsAgent::sync_simulation`].
struct PendingFrame {
    registry: SimulationRegistry,
    plan: StepPlan,
    interpolation_factor: f32,
    worker_seconds: f32,
}

/// Schedules physics work frame by frame.
///
/// Each frame goes through [`prepare`](Self::prepare), which plans how many
/// fixed steps fit in the time budget and runs them over the job system, and
/// [`sync_simulation`](Self::sync_simulation), which publishes the results to
/// the simulated objects. The agent owns the simulation registry between the
/// two calls and the line-of-sight cache for its whole lifetime.
pub struct PhysicsAgent {
    settings: PhysicsSettings,
    provider: Arc<dyn PhysicsProvider>,
    solver: Arc<dyn MovementSolver>,
    jobs: JobSystem,
    /// Exclusive for structural changes, shared while jobs read the engine.
    simulation_lock: PolicyLock<()>,
    movement_lane: ActorMovementLane,
    los_lane: LineOfSightLane,
    debug_lane: PhysicsDebugLane,
    budget: BudgetEstimator,
    async_budget: BudgetEstimator,
    budget_cursor: usize,
    world: WorldFrameData,
    pending: Option<PendingFrame>,
    interpolation_factor: f32,
    stats: PhysicsFrameStats,
}

impl PhysicsAgent {
    /// Creates an agent driving `provider` and `solver` with `settings`.
    pub fn new(
        settings: PhysicsSettings,
        provider: Arc<dyn PhysicsProvider>,
        solver: Arc<dyn MovementSolver>,
    ) -> anyhow::Result<Self> {
        settings
            .validate()
            .context("refusing to start physics with invalid settings")?;
        let jobs = JobSystem::new(settings.worker_threads)
            .context("failed to start the physics job system")?;
        let policy = settings.resolved_policy();

        let movement_lane = ActorMovementLane::new(settings.job_batch_size);
        let los_lane = LineOfSightLane::new(policy, settings.los_cache_expiry);
        let debug_lane = PhysicsDebugLane::new();

        log::info!(
            "PhysicsAgent: {} workers, {} locking, step {:.4}s",
            jobs.concurrency(),
            policy,
            settings.step_duration
        );
        log::debug!(
            "PhysicsAgent: lanes [{}]",
            describe_lanes(&[&movement_lane, &los_lane, &debug_lane])
        );

        let seed = settings.step_duration;
        Ok(Self {
            simulation_lock: PolicyLock::new(policy, ()),
            provider,
            solver,
            jobs,
            movement_lane,
            los_lane,
            debug_lane,
            budget: BudgetEstimator::new(seed),
            async_budget: BudgetEstimator::new(seed),
            budget_cursor: 0,
            world: WorldFrameData::default(),
            pending: None,
            interpolation_factor: 0.0,
            stats: PhysicsFrameStats::default(),
            settings,
        })
    }

    /// Plans and runs the physics steps owed for `accumulated` seconds.
    ///
    /// `registry` holds the simulations of this frame and `frame_start` is
    /// when the frame began, for budget measurements. The registry stays with
    /// the agent until [`sync_simulation`](Self::sync_simulation).
    ///
    /// Returns the time left in the accumulator after the planned steps.
    pub fn prepare(
        &mut self,
        accumulated: f32,
        registry: SimulationRegistry,
        frame_start: Instant,
    ) -> f32 {
        if self.pending.is_some() {
            log::warn!(
                "PhysicsAgent: frame {} was never synced, syncing it before the next one",
                self.stats.frame_number
            );
            if let Some(previous) = self.sync_simulation() {
                log::debug!(
                    "PhysicsAgent: released {} simulations of the unsynced frame",
                    previous.len()
                );
            }
        }

        let dt = self.settings.step_duration;
        let plan = plan_steps(accumulated, dt, self.budget.get(), self.async_budget.get());
        let leftover = (accumulated - plan.simulated_time()).max(0.0);
        let interpolation_factor = saturate(leftover / plan.step_delta);

        if plan.is_degraded(dt) {
            log::debug!(
                "PhysicsAgent: over budget, {} steps of {:.4}s for {:.4}s owed",
                plan.steps,
                plan.step_delta,
                accumulated
            );
        }

        let mut registry = registry;
        self.los_lane.reset_cursor();
        {
            let _guard = self.simulation_lock.write();
            registry.visit(&mut InitPositionVisitor {
                provider: self.provider.as_ref(),
            });
        }

        self.stats.frame_number += 1;
        self.stats.steps = plan.steps;
        self.stats.step_delta = plan.step_delta;
        self.stats.simulations = registry.len();

        let mut worker_seconds = 0.0;
        self.stats.los_reaped = 0;
        if plan.steps > 0 {
            let watch = Stopwatch::new();
            let reaped = self.do_simulation(&mut registry, plan);
            worker_seconds = watch.elapsed_secs();
            self.stats.los_reaped = reaped;

            let total = Stopwatch::started_at(frame_start).elapsed_secs();
            self.budget.update(total, plan.steps, self.budget_cursor);
            self.stats.record_physics_time(total);
        }
        self.stats.worker_seconds = worker_seconds;

        self.pending = Some(PendingFrame {
            registry,
            plan,
            interpolation_factor,
            worker_seconds,
        });
        leftover
    }

    /// Runs the planned steps, then refreshes and reaps the LOS cache.
    ///
    /// Returns how many cached pairs were dropped.
    fn do_simulation(&self, registry: &mut SimulationRegistry, plan: StepPlan) -> usize {
        let world = self.world.clone();
        let ctx = StepContext {
            provider: self.provider.as_ref(),
            solver: self.solver.as_ref(),
            world: &world,
            jobs: &self.jobs,
            simulation_lock: &self.simulation_lock,
        };

        let mut skipped = 0;
        for _ in 0..plan.steps {
            skipped += self.movement_lane.step(registry, &ctx, plan.step_delta).skipped;
        }
        if skipped > 0 {
            log::trace!("PhysicsAgent: {skipped} movement jobs skipped destroyed objects");
        }

        {
            let _guard = self.simulation_lock.read();
            self.los_lane.refresh(self.provider.as_ref(), &self.jobs);
        }
        self.los_lane.reap()
    }

    /// Publishes the results of the pending frame and hands its registry back.
    ///
    /// Returns `None` when no frame is pending.
    pub fn sync_simulation(&mut self) -> Option<SimulationRegistry> {
        let PendingFrame {
            mut registry,
            plan,
            interpolation_factor,
            worker_seconds,
        } = self.pending.take()?;

        let advanced = plan.steps > 0;
        let mut sync = SyncVisitor::new(interpolation_factor, advanced);
        let live = {
            let _guard = self.simulation_lock.write();
            registry.visit(&mut sync)
        };

        if advanced {
            self.async_budget
                .update(worker_seconds, plan.steps, self.budget_cursor);
            self.budget_cursor = self.budget_cursor.wrapping_add(1);
        }

        self.interpolation_factor = interpolation_factor;
        self.stats.live_simulations = live;
        self.stats.landings = sync.landings;
        self.stats.los_entries = self.los_lane.len();
        log::trace!(
            "PhysicsAgent: frame {} synced, {} x {:.4}s, {}/{} live, {} landings, {} LOS",
            self.stats.frame_number,
            self.stats.steps,
            self.stats.step_delta,
            live,
            self.stats.simulations,
            sync.landings,
            self.stats.los_entries
        );

        Some(registry)
    }

    /// Drops any in-flight frame and snaps every body to its actor.
    ///
    /// Used after teleports and loads, where interpolating from the old
    /// state would be wrong.
    pub fn reset_simulation(&mut self, actors: &ActorStore) {
        let _guard = self.simulation_lock.write();
        self.pending = None;

        let seed = self.settings.step_duration;
        self.budget.reset(seed);
        self.async_budget.reset(seed);
        self.budget_cursor = 0;
        self.los_lane.clear();

        for actor in actors.iter() {
            let position = actor.position();
            actor.reset_position(position);
            self.provider.set_body_pose(actor.body(), position);
            self.provider.update_aabb(actor.body());
        }
        log::debug!("PhysicsAgent: simulation reset with {} actors", actors.len());
    }

    /// Whether `a` can see `b`. Symmetric; answers from the cache when it can.
    pub fn get_line_of_sight(&self, a: &Arc<Actor>, b: &Arc<Actor>) -> bool {
        let _guard = self.simulation_lock.read();
        self.los_lane.get(self.provider.as_ref(), a, b)
    }

    /// Creates a body and adds it to the engine.
    pub fn add_body(&self, desc: &BodyDesc, activate: bool) -> BodyHandle {
        let _guard = self.simulation_lock.write();
        let handle = self.provider.create_body(desc);
        self.provider.add_body(handle, activate);
        handle
    }

    /// Removes a body from the engine and destroys it.
    pub fn remove_body(&self, handle: BodyHandle) {
        let _guard = self.simulation_lock.write();
        self.provider.remove_body(handle);
        self.provider.destroy_body(handle);
    }

    /// Casts a ray against the engine.
    pub fn ray_test(
        &self,
        ray: &Ray,
        max_toi: f32,
        filter: &RayFilter,
    ) -> Result<Option<RaycastHit>, RaycastError> {
        let _guard = self.simulation_lock.read();
        self.provider.cast_ray(ray, max_toi, filter)
    }

    /// Draws the engine's debug geometry. Returns the number of lines drawn.
    pub fn debug_draw(&self, drawer: &mut dyn DebugDrawer) -> usize {
        let _guard = self.simulation_lock.read();
        self.debug_lane.draw(self.provider.as_ref(), drawer)
    }

    /// Sets the storm force applied from the next frame on.
    pub fn set_storm(&mut self, storm: Option<Vec3>) {
        self.world.storm = storm;
    }

    /// Sets the bodies actors can be carried by from the next frame on.
    pub fn set_movable_bodies(&mut self, bodies: Vec<BodyHandle>) {
        self.world.movable_bodies = bodies;
    }

    /// Blend factor between the last two physics states, for rendering.
    pub fn interpolation_factor(&self) -> f32 {
        self.interpolation_factor
    }

    /// Whether a prepared frame is waiting to be synced.
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Statistics of the last frame.
    pub fn stats(&self) -> &PhysicsFrameStats {
        &self.stats
    }

    /// The settings the agent runs with.
    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// The locking policy the agent runs with.
    pub fn locking_policy(&self) -> LockingPolicy {
        self.simulation_lock.policy()
    }

    /// Number of cached line-of-sight pairs.
    pub fn los_cache_len(&self) -> usize {
        self.los_lane.len()
    }
}
