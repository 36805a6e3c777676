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

//! Frame-local working data handed to the movement solver.
//!
//! Each simulated object owns one of these for the duration of a frame. The
//! scheduler's visitors fill them from the authoritative game objects before
//! the first step and publish them back after the last.

use super::{BodyHandle, CollisionLayers, RaycastHit};
use crate::math::Vec3;

/// Mutable working state of one actor during a physics frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorFrameData {
    /// Engine body of the actor.
    pub body: BodyHandle,
    /// Half-extents of the actor's collision box.
    pub half_extents: Vec3,
    /// Resolved position, updated by every step.
    pub position: Vec3,
    /// Euler rotation (radians).
    pub rotation: Vec3,
    /// Desired velocity requested by game logic for this frame.
    pub movement: Vec3,
    /// Carried velocity (gravity, knock-back).
    pub inertia: Vec3,
    /// Movable body the actor currently stands on.
    pub standing_on: Option<BodyHandle>,
    /// On-ground flag as resolved by the solver.
    pub is_on_ground: bool,
    /// On-ground flag at the start of the frame.
    pub was_on_ground: bool,
    /// Standing on a slope too steep to walk.
    pub is_on_slope: bool,
    /// Walking on the water surface.
    pub walking_on_water: bool,
    /// Ignores gravity.
    pub flying: bool,
    /// Whether the water surface is solid for this actor (water walking).
    pub water_collision: bool,
    /// Height of the water surface at the actor's location.
    pub water_level: f32,
    /// Height below which the actor swims.
    pub swim_level: f32,
    /// Gravity multiplier in `[0, 1]`; `1.0` is a normal fall.
    pub slow_fall: f32,
    /// Height at the start of the frame, for fall tracking.
    pub old_height: f32,
    /// Consecutive steps spent stuck.
    pub stuck_frames: u32,
    /// Position where the stuck streak started.
    pub last_stuck_position: Vec3,
}

impl ActorFrameData {
    /// Fresh working data for `body`, located at `position`.
    pub fn new(body: BodyHandle, position: Vec3, half_extents: Vec3) -> Self {
        Self {
            body,
            half_extents,
            position,
            rotation: Vec3::ZERO,
            movement: Vec3::ZERO,
            inertia: Vec3::ZERO,
            standing_on: None,
            is_on_ground: false,
            was_on_ground: false,
            is_on_slope: false,
            walking_on_water: false,
            flying: false,
            water_collision: false,
            water_level: f32::NEG_INFINITY,
            swim_level: f32::NEG_INFINITY,
            slow_fall: 1.0,
            old_height: position.y,
            stuck_frames: 0,
            last_stuck_position: position,
        }
    }

    /// Whether the actor's center is below its swim line.
    #[inline]
    pub fn is_under_water(&self) -> bool {
        self.position.y < self.swim_level
    }
}

/// Mutable working state of one projectile during a physics frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileFrameData {
    /// Current position.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Layers the projectile collides with.
    pub mask: CollisionLayers,
    /// Body that fired the projectile; never hit.
    pub caster: Option<BodyHandle>,
    /// First hit, once the projectile struck something.
    pub hit: Option<RaycastHit>,
}

impl ProjectileFrameData {
    /// Whether the projectile has already struck something.
    #[inline]
    pub fn has_hit(&self) -> bool {
        self.hit.is_some()
    }
}

/// Read-mostly world state shared by every movement job of a frame.
///
/// Created fresh for each frame that advances and dropped when it is synced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldFrameData {
    /// Horizontal storm force, if a storm is blowing.
    pub storm: Option<Vec3>,
    /// Bodies actors may stand on and be carried by.
    pub movable_bodies: Vec<BodyHandle>,
}

impl WorldFrameData {
    /// Whether `body` is one of the movable bodies of this frame.
    pub fn is_movable(&self, body: BodyHandle) -> bool {
        self.movable_bodies.contains(&body)
    }
}
