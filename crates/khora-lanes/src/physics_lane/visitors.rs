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

//! Visitors run over the simulation registry at each phase of a frame.
//!
//! Order within a frame: [`InitPositionVisitor`] once, then per step
//! [`PreStepVisitor`], the [`MoveVisitor`] jobs and [`PostStepVisitor`],
//! and finally [`SyncVisitor`] when the frame is published.

use khora_core::math::Vec3;
use khora_core::physics::{
    ActorFrameData, CollisionLayers, MovementSolver, PhysicsProvider, ProjectileFrameData, Ray,
    RayFilter, WorldFrameData,
};
use khora_data::actor::Actor;
use khora_data::projectile::Projectile;
use khora_data::simulation::SimulationVisitor;

/// Render-time position between two physics states.
#[inline]
pub fn interpolate(previous: Vec3, current: Vec3, factor: f32) -> Vec3 {
    Vec3::lerp(previous, current, factor)
}

/// Whether an actor can rise straight up from `from` to height `surface_y`
/// without hitting anything. A failed query counts as blocked.
pub fn can_move_to_water_surface(
    provider: &dyn PhysicsProvider,
    frame: &ActorFrameData,
    surface_y: f32,
) -> bool {
    let target = Vec3::new(frame.position.x, surface_y, frame.position.z);
    let Some((ray, distance)) = Ray::between(frame.position, target) else {
        return true;
    };
    let filter = RayFilter::new(CollisionLayers::LINE_OF_SIGHT).excluding(frame.body);
    matches!(provider.cast_ray(&ray, distance, &filter), Ok(None))
}

/// Loads working data from the authoritative objects before the first step.
///
/// Applies pending out-of-band offsets and lifts water-walking actors that
/// ended up below the water surface.
pub struct InitPositionVisitor<'a> {
    /// The physics engine.
    pub provider: &'a dyn PhysicsProvider,
}

impl SimulationVisitor for InitPositionVisitor<'_> {
    fn visit_actor(&mut self, actor: &Actor, frame: &mut ActorFrameData) {
        let mut state = actor.state_mut();

        let offset = std::mem::take(&mut state.pending_offset);
        let moved = offset != Vec3::ZERO;
        if moved {
            state.position += offset;
            state.previous_position += offset;
        }

        frame.position = state.position;
        frame.rotation = state.rotation;
        frame.movement = state.movement;
        frame.inertia = state.inertia;
        frame.standing_on = state.standing_on;
        frame.is_on_ground = state.on_ground;
        frame.was_on_ground = state.on_ground;
        frame.is_on_slope = state.on_slope;
        frame.walking_on_water = state.walking_on_water;
        frame.flying = state.flying;
        frame.water_collision = state.water_collision;
        frame.water_level = state.water_level;
        frame.swim_level = state.swim_level;
        frame.slow_fall = state.slow_fall;
        frame.stuck_frames = state.stuck_frames;
        frame.last_stuck_position = state.last_stuck_position;

        // Feet below a walkable water surface: surface if nothing is above.
        let surface_y = frame.water_level + frame.half_extents.y;
        let surfaced = frame.water_collision
            && frame.position.y < surface_y
            && can_move_to_water_surface(self.provider, frame, surface_y);
        if surfaced {
            frame.position.y = surface_y;
            state.position = frame.position;
            state.previous_position = frame.position;
        }

        frame.old_height = frame.position.y;
        drop(state);

        if moved || surfaced {
            self.provider.set_body_pose(frame.body, frame.position);
            self.provider.update_aabb(frame.body);
        }
    }

    fn visit_projectile(&mut self, projectile: &Projectile, frame: &mut ProjectileFrameData) {
        let state = projectile.state();
        frame.position = state.position;
        frame.velocity = state.velocity;
        frame.hit = state.hit;
    }
}

/// Frees stuck actors before the movement jobs of a step.
pub struct PreStepVisitor<'a> {
    /// The movement solver.
    pub solver: &'a dyn MovementSolver,
    /// The physics engine.
    pub provider: &'a dyn PhysicsProvider,
}

impl SimulationVisitor for PreStepVisitor<'_> {
    fn visit_actor(&mut self, _actor: &Actor, frame: &mut ActorFrameData) {
        self.solver.unstick(frame, self.provider);
    }

    fn visit_projectile(&mut self, _projectile: &Projectile, _frame: &mut ProjectileFrameData) {}
}

/// Resolves one step of movement. One instance per job.
#[derive(Clone, Copy)]
pub struct MoveVisitor<'a> {
    /// The movement solver.
    pub solver: &'a dyn MovementSolver,
    /// The physics engine.
    pub provider: &'a dyn PhysicsProvider,
    /// Shared state of the frame.
    pub world: &'a WorldFrameData,
    /// Step delta in seconds.
    pub dt: f32,
}

impl SimulationVisitor for MoveVisitor<'_> {
    fn visit_actor(&mut self, _actor: &Actor, frame: &mut ActorFrameData) {
        self.solver.move_actor(frame, self.dt, self.provider, self.world);
    }

    fn visit_projectile(&mut self, _projectile: &Projectile, frame: &mut ProjectileFrameData) {
        self.solver.move_projectile(frame, self.dt, self.provider, self.world);
    }
}

/// Publishes resolved positions after the barrier of a step.
pub struct PostStepVisitor<'a> {
    /// The physics engine.
    pub provider: &'a dyn PhysicsProvider,
}

impl SimulationVisitor for PostStepVisitor<'_> {
    fn visit_actor(&mut self, actor: &Actor, frame: &mut ActorFrameData) {
        if actor.set_position(frame.position) {
            // Re-read: the authoritative object may clamp what it is given.
            frame.position = actor.position();
            self.provider.set_body_pose(frame.body, frame.position);
            self.provider.update_aabb(frame.body);
        }
    }

    fn visit_projectile(&mut self, projectile: &Projectile, frame: &mut ProjectileFrameData) {
        let mut state = projectile.state_mut();
        state.previous_position = state.position;
        state.position = frame.position;
        state.hit = frame.hit;
    }
}

/// Folds the results of a frame back into the authoritative objects.
#[derive(Debug, Default)]
pub struct SyncVisitor {
    /// Interpolation factor between the last two physics states.
    pub interpolation_factor: f32,
    /// Whether the frame ran any step.
    pub advanced: bool,
    /// Landings recorded during this sync.
    pub landings: usize,
}

impl SyncVisitor {
    /// A sync pass for a frame that did (`advanced`) or did not run steps.
    pub fn new(interpolation_factor: f32, advanced: bool) -> Self {
        Self {
            interpolation_factor,
            advanced,
            landings: 0,
        }
    }
}

impl SimulationVisitor for SyncVisitor {
    fn visit_actor(&mut self, actor: &Actor, frame: &mut ActorFrameData) {
        let mut state = actor.state_mut();
        state.render_position = interpolate(
            state.previous_position,
            state.position,
            self.interpolation_factor,
        );

        if !self.advanced {
            return;
        }

        state.standing_on = frame.standing_on;
        // Game logic changed the flag during the frame: its value wins.
        if state.on_ground == frame.was_on_ground {
            state.on_ground = frame.is_on_ground;
        }
        state.on_slope = frame.is_on_slope;
        state.walking_on_water = frame.walking_on_water;
        state.inertia = frame.inertia;
        state.stuck_frames = frame.stuck_frames;
        state.last_stuck_position = frame.last_stuck_position;

        let height_diff = frame.position.y - frame.old_height;
        let still_on_ground = height_diff >= 0.0 && frame.was_on_ground && frame.is_on_ground;
        if still_on_ground || frame.flying || frame.is_under_water() || frame.slow_fall < 1.0 {
            if let Some(landing) = state.fall.land() {
                state.landings.push(landing);
                self.landings += 1;
            }
        } else if height_diff < 0.0 {
            state.fall.add(-height_diff);
        }
    }

    fn visit_projectile(&mut self, projectile: &Projectile, _frame: &mut ProjectileFrameData) {
        let mut state = projectile.state_mut();
        state.render_position = interpolate(
            state.previous_position,
            state.position,
            self.interpolation_factor,
        );
    }
}
