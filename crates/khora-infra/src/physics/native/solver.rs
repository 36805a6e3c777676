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

use khora_core::math::{Vec3, EPSILON};
use khora_core::physics::{
    ActorFrameData, CollisionLayers, MovementSolver, PhysicsProvider, Ray, RayFilter, RaycastHit,
    WorldFrameData,
};

/// Steps an actor stays stuck before [`SimpleMovementSolver::unstick`] lifts it.
pub const STUCK_STEPS: u32 = 10;

/// Penetration depth below which an actor resting against a face is not embedded.
const CONTACT_SKIN: f32 = 1e-3;

/// A kinematic character controller for box-shaped actors.
///
/// Walks along the ground, stops at walls, falls under gravity and lands on
/// whatever solid geometry is below. Actors with water collision walk on the
/// water surface.
#[derive(Debug, Clone)]
pub struct SimpleMovementSolver {
    /// Downward acceleration, in units per second squared.
    pub gravity: f32,
    /// Highest falling speed.
    pub terminal_velocity: f32,
    /// Layers actors collide with.
    pub mask: CollisionLayers,
}

impl Default for SimpleMovementSolver {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            terminal_velocity: 60.0,
            mask: CollisionLayers::WORLD | CollisionLayers::HEIGHTMAP | CollisionLayers::DOOR,
        }
    }
}

impl SimpleMovementSolver {
    fn cast(
        &self,
        provider: &dyn PhysicsProvider,
        frame: &ActorFrameData,
        direction: Vec3,
        distance: f32,
    ) -> Option<RaycastHit> {
        let ray = Ray {
            origin: frame.position,
            direction,
        };
        let filter = RayFilter::new(self.mask).excluding(frame.body);
        match provider.cast_ray(&ray, distance, &filter) {
            Ok(hit) => hit,
            Err(e) => {
                log::trace!("SimpleMovementSolver: {e}, treating as clear");
                None
            }
        }
    }

    /// Moves horizontally by `delta`, stopping in front of obstacles.
    ///
    /// Returns `true` when the actor starts inside the obstacle it walks
    /// into. Resting flush against a face is not embedded.
    fn slide(
        &self,
        provider: &dyn PhysicsProvider,
        frame: &mut ActorFrameData,
        delta: Vec3,
    ) -> bool {
        let distance = delta.length();
        if distance < EPSILON {
            return false;
        }
        let direction = delta / distance;
        let radius = frame.half_extents.x.max(frame.half_extents.z);
        let (travel, embedded) = match self.cast(provider, frame, direction, distance + radius) {
            Some(hit) => (
                (hit.toi - radius).clamp(0.0, distance),
                hit.toi < radius - CONTACT_SKIN,
            ),
            None => (distance, false),
        };
        frame.position += direction * travel;
        embedded
    }

    /// Moves vertically by `dy`, landing on the ground or stopping at a ceiling.
    fn climb_or_fall(
        &self,
        provider: &dyn PhysicsProvider,
        frame: &mut ActorFrameData,
        dy: f32,
        world: &WorldFrameData,
    ) {
        let half_height = frame.half_extents.y;
        if dy > 0.0 {
            frame.is_on_ground = false;
            frame.standing_on = None;
            let travel = match self.cast(provider, frame, Vec3::Y, dy + half_height) {
                Some(hit) => {
                    frame.inertia.y = 0.0;
                    (hit.toi - half_height).clamp(0.0, dy)
                }
                None => dy,
            };
            frame.position.y += travel;
            return;
        }

        let drop = -dy;
        match self.cast(provider, frame, -Vec3::Y, drop + half_height) {
            Some(hit) => {
                frame.position.y = hit.point.y + half_height;
                frame.is_on_ground = true;
                frame.inertia.y = 0.0;
                frame.standing_on = world.is_movable(hit.body).then_some(hit.body);
            }
            None => {
                frame.position.y -= drop;
                frame.is_on_ground = false;
                frame.standing_on = None;
            }
        }

        let surface = frame.water_level + half_height;
        frame.walking_on_water = false;
        if frame.water_collision && frame.position.y <= surface {
            frame.position.y = surface;
            frame.is_on_ground = true;
            frame.walking_on_water = true;
            frame.inertia.y = 0.0;
            frame.standing_on = None;
        }
    }
}

impl MovementSolver for SimpleMovementSolver {
    fn unstick(&self, frame: &mut ActorFrameData, provider: &dyn PhysicsProvider) {
        if frame.stuck_frames < STUCK_STEPS {
            return;
        }
        let lift = frame.half_extents.y;
        if self.cast(provider, frame, Vec3::Y, lift * 2.0).is_none() {
            log::debug!(
                "SimpleMovementSolver: lifting {:?} stuck for {} steps",
                frame.body,
                frame.stuck_frames
            );
            frame.position.y += lift;
            frame.is_on_ground = false;
        }
        frame.stuck_frames = 0;
    }

    fn move_actor(
        &self,
        frame: &mut ActorFrameData,
        dt: f32,
        provider: &dyn PhysicsProvider,
        world: &WorldFrameData,
    ) {
        let start = frame.position;
        let weightless = frame.flying || frame.is_under_water();

        if weightless {
            frame.inertia.y = 0.0;
        } else {
            frame.inertia.y = (frame.inertia.y - self.gravity * frame.slow_fall * dt)
                .max(-self.terminal_velocity);
        }

        let mut velocity = frame.movement + frame.inertia;
        if let Some(storm) = world.storm {
            velocity += Vec3::new(storm.x, 0.0, storm.z);
        }

        let horizontal = Vec3::new(velocity.x * dt, 0.0, velocity.z * dt);
        let embedded = self.slide(provider, frame, horizontal);
        let dy = velocity.y * dt;
        if weightless && dy.abs() < EPSILON {
            frame.is_on_ground = false;
            frame.standing_on = None;
        } else {
            self.climb_or_fall(provider, frame, dy, world);
        }
        frame.is_on_slope = false;

        // Wedged inside geometry and went nowhere: count it towards unsticking.
        let wants_to_move = frame.movement.length_squared() > EPSILON;
        if wants_to_move && embedded && frame.position.distance(start) < EPSILON {
            if frame.stuck_frames == 0 {
                frame.last_stuck_position = start;
            }
            frame.stuck_frames += 1;
        } else {
            frame.stuck_frames = 0;
        }
    }
}
