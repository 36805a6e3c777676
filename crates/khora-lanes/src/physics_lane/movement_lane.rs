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

use std::sync::atomic::{AtomicUsize, Ordering};

use khora_core::jobs::JobSystem;
use khora_core::lane::{Lane, LaneKind};
use khora_core::physics::{MovementSolver, PhysicsProvider, WorldFrameData};
use khora_core::sync::PolicyLock;
use khora_data::simulation::{SimulationEntry, SimulationRegistry};

use super::visitors::{MoveVisitor, PostStepVisitor, PreStepVisitor};

/// Everything a step needs besides the registry.
pub struct StepContext<'a> {
    /// The physics engine.
    pub provider: &'a dyn PhysicsProvider,
    /// The movement solver.
    pub solver: &'a dyn MovementSolver,
    /// Shared state of the frame.
    pub world: &'a WorldFrameData,
    /// Workers the movement jobs run on.
    pub jobs: &'a JobSystem,
    /// Guards structural changes to the simulated world against movement jobs.
    pub simulation_lock: &'a PolicyLock<()>,
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Entries whose movement was resolved.
    pub moved: usize,
    /// Entries skipped because their object was destroyed.
    pub skipped: usize,
}

/// Dispatches per-object movement over the job system, one step at a time.
#[derive(Debug)]
pub struct ActorMovementLane {
    batch_size: usize,
}

impl ActorMovementLane {
    /// Creates the lane. Each movement job covers at least `batch_size`
    /// entries; `1` means one job per entry.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Minimum number of entries per movement job.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Runs one step of `dt` seconds over `registry`.
    ///
    /// Returns once every movement job has finished and resolved positions
    /// have been published.
    pub fn step(
        &self,
        registry: &mut SimulationRegistry,
        ctx: &StepContext<'_>,
        dt: f32,
    ) -> StepOutcome {
        // ── 1. Pre-step, exclusive ──
        {
            let _guard = ctx.simulation_lock.write();
            let mut pre = PreStepVisitor {
                solver: ctx.solver,
                provider: ctx.provider,
            };
            registry.visit(&mut pre);
        }

        // ── 2. Movement jobs, barrier ──
        let moved = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let mover = MoveVisitor {
            solver: ctx.solver,
            provider: ctx.provider,
            world: ctx.world,
            dt,
        };
        ctx.jobs
            .for_each_mut(registry.entries_mut(), self.batch_size, |entry: &mut SimulationEntry| {
                let Some(locked) = entry.lock() else {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                };
                let _guard = ctx.simulation_lock.read();
                let mut visitor = mover;
                locked.accept(&mut visitor);
                moved.fetch_add(1, Ordering::Relaxed);
            });

        // ── 3. Post-step publication ──
        {
            let _guard = ctx.simulation_lock.write();
            let mut post = PostStepVisitor {
                provider: ctx.provider,
            };
            registry.visit(&mut post);
        }

        let outcome = StepOutcome {
            moved: moved.into_inner(),
            skipped: skipped.into_inner(),
        };
        log::trace!(
            "ActorMovementLane: step dt={dt:.4} moved={} skipped={}",
            outcome.moved,
            outcome.skipped
        );
        outcome
    }
}

impl Default for ActorMovementLane {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Lane for ActorMovementLane {
    fn strategy_name(&self) -> &'static str {
        "ActorMovement"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Physics
    }
}
