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

//! Actors: characters moved by the physics scheduler.

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use khora_core::math::Vec3;
use khora_core::physics::BodyHandle;
use serde::{Deserialize, Serialize};

pub mod store;

/// Fraction of the half-height at which an actor's eyes sit above its center.
pub const EYE_HEIGHT_FACTOR: f32 = 0.9;

/// A unique identifier for an actor.
///
/// Combines a slot index with a generation count so that handles to a
/// despawned actor never resolve to the actor that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId {
    /// Slot index in the owning [`store::ActorStore`].
    pub index: u32,
    /// Incremented each time the slot is recycled.
    pub generation: u32,
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({}v{})", self.index, self.generation)
    }
}

/// Spawn parameters of an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorDesc {
    /// Display name.
    pub name: String,
    /// Initial center position.
    pub position: Vec3,
    /// Half-extents of the collision box.
    pub half_extents: Vec3,
    /// Whether the actor ignores gravity.
    pub flying: bool,
    /// Whether the actor walks on the water surface.
    pub water_collision: bool,
}

impl Default for ActorDesc {
    fn default() -> Self {
        Self {
            name: String::from("actor"),
            position: Vec3::ZERO,
            half_extents: Vec3::new(0.5, 1.0, 0.5),
            flying: false,
            water_collision: false,
        }
    }
}

/// Accumulated fall of an actor since it last stood on something.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FallStats {
    /// Height fallen so far.
    pub height: f32,
}

impl FallStats {
    /// Adds `height` to the current fall.
    pub fn add(&mut self, height: f32) {
        self.height += height;
    }

    /// Ends the current fall, returning a landing if the actor fell at all.
    pub fn land(&mut self) -> Option<Landing> {
        let height = std::mem::take(&mut self.height);
        (height > 0.0).then_some(Landing { height })
    }
}

/// A landing event produced when a fall ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    /// Total height of the fall.
    pub height: f32,
}

/// Authoritative game-side state of an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    /// Current position.
    pub position: Vec3,
    /// Position before the last physics update, for interpolation.
    pub previous_position: Vec3,
    /// Interpolated position to render this frame.
    pub render_position: Vec3,
    /// Offset requested by game logic, applied before the next physics frame.
    pub pending_offset: Vec3,
    /// Euler rotation (radians).
    pub rotation: Vec3,
    /// Desired velocity.
    pub movement: Vec3,
    /// Carried velocity.
    pub inertia: Vec3,
    /// On-ground flag.
    pub on_ground: bool,
    /// Standing on an unwalkable slope.
    pub on_slope: bool,
    /// Walking on the water surface.
    pub walking_on_water: bool,
    /// Ignores gravity.
    pub flying: bool,
    /// Walks on the water surface.
    pub water_collision: bool,
    /// Water surface height at the actor's location.
    pub water_level: f32,
    /// Height below which the actor swims.
    pub swim_level: f32,
    /// Gravity multiplier in `[0, 1]`; `1.0` is a normal fall.
    pub slow_fall: f32,
    /// Movable body the actor stands on.
    pub standing_on: Option<BodyHandle>,
    /// Consecutive steps spent stuck.
    pub stuck_frames: u32,
    /// Where the stuck streak started.
    pub last_stuck_position: Vec3,
    /// Current fall.
    pub fall: FallStats,
    /// Landings not yet consumed by game logic.
    pub landings: Vec<Landing>,
}

/// A character simulated by the physics scheduler.
///
/// Owned through an `Arc` by the [`store::ActorStore`]; everything else holds
/// `Weak` references.
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    name: String,
    body: BodyHandle,
    half_extents: Vec3,
    state: RwLock<ActorState>,
}

impl Actor {
    /// Creates an actor backed by engine body `body`.
    pub fn new(id: ActorId, desc: ActorDesc, body: BodyHandle) -> Self {
        let state = ActorState {
            position: desc.position,
            previous_position: desc.position,
            render_position: desc.position,
            pending_offset: Vec3::ZERO,
            rotation: Vec3::ZERO,
            movement: Vec3::ZERO,
            inertia: Vec3::ZERO,
            on_ground: false,
            on_slope: false,
            walking_on_water: false,
            flying: desc.flying,
            water_collision: desc.water_collision,
            water_level: f32::NEG_INFINITY,
            swim_level: f32::NEG_INFINITY,
            slow_fall: 1.0,
            standing_on: None,
            stuck_frames: 0,
            last_stuck_position: desc.position,
            fall: FallStats::default(),
            landings: Vec::new(),
        };
        Self {
            id,
            name: desc.name,
            body,
            half_extents: desc.half_extents,
            state: RwLock::new(state),
        }
    }

    /// The actor's identifier.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// The actor's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The engine body backing the actor.
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Half-extents of the collision box.
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Read access to the actor's state.
    pub fn state(&self) -> RwLockReadGuard<'_, ActorState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Write access to the actor's state.
    pub fn state_mut(&self) -> RwLockWriteGuard<'_, ActorState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.state().position
    }

    /// Position of the actor's eyes, used for visibility rays.
    pub fn eye_position(&self) -> Vec3 {
        self.position() + Vec3::Y * (self.half_extents.y * EYE_HEIGHT_FACTOR)
    }

    /// Moves the actor to `position`, keeping the old one for interpolation.
    /// Returns `true` if the position actually changed.
    pub fn set_position(&self, position: Vec3) -> bool {
        let mut state = self.state_mut();
        state.previous_position = state.position;
        if state.position == position {
            return false;
        }
        state.position = position;
        true
    }

    /// Snaps the actor to `position`, discarding interpolation history and
    /// any pending offset.
    pub fn reset_position(&self, position: Vec3) {
        let mut state = self.state_mut();
        state.position = position;
        state.previous_position = position;
        state.render_position = position;
        state.pending_offset = Vec3::ZERO;
        state.last_stuck_position = position;
        state.stuck_frames = 0;
    }

    /// Requests an out-of-band displacement, applied before the next physics frame.
    pub fn move_by(&self, offset: Vec3) {
        self.state_mut().pending_offset += offset;
    }

    /// Sets the desired velocity for the next frames.
    pub fn set_movement(&self, movement: Vec3) {
        self.state_mut().movement = movement;
    }

    /// Overrides the on-ground flag from game logic.
    pub fn set_on_ground(&self, on_ground: bool) {
        self.state_mut().on_ground = on_ground;
    }

    /// Toggles flight.
    pub fn set_flying(&self, flying: bool) {
        self.state_mut().flying = flying;
    }

    /// Sets the water surface and swim line at the actor's location.
    pub fn set_water(&self, water_level: f32, swim_level: f32) {
        let mut state = self.state_mut();
        state.water_level = water_level;
        state.swim_level = swim_level;
    }

    /// Takes every landing recorded since the last call.
    pub fn drain_landings(&self) -> Vec<Landing> {
        std::mem::take(&mut self.state_mut().landings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn actor_at(position: Vec3) -> Actor {
        Actor::new(
            ActorId {
                index: 0,
                generation: 0,
            },
            ActorDesc {
                position,
                ..Default::default()
            },
            BodyHandle(1),
        )
    }

    #[test]
    fn test_set_position_tracks_previous() {
        let actor = actor_at(Vec3::ZERO);
        assert!(actor.set_position(Vec3::X));
        assert!(!actor.set_position(Vec3::X));
        let state = actor.state();
        assert_eq!(state.position, Vec3::X);
        assert_eq!(state.previous_position, Vec3::X);
    }

    #[test]
    fn test_eye_position() {
        let actor = actor_at(Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(actor.eye_position().y, 2.9);
    }

    #[test]
    fn test_fall_stats_land() {
        let mut fall = FallStats::default();
        assert!(fall.land().is_none());
        fall.add(1.5);
        fall.add(0.5);
        assert_eq!(fall.land(), Some(Landing { height: 2.0 }));
        assert_eq!(fall.height, 0.0);
    }

    #[test]
    fn test_move_by_accumulates_and_reset_clears() {
        let actor = actor_at(Vec3::ZERO);
        actor.move_by(Vec3::X);
        actor.move_by(Vec3::Z);
        assert_eq!(actor.state().pending_offset, Vec3::new(1.0, 0.0, 1.0));
        actor.reset_position(Vec3::Y);
        let state = actor.state();
        assert_eq!(state.pending_offset, Vec3::ZERO);
        assert_eq!(state.render_position, Vec3::Y);
    }

    #[test]
    fn test_drain_landings() {
        let actor = actor_at(Vec3::ZERO);
        actor.state_mut().landings.push(Landing { height: 3.0 });
        assert_eq!(actor.drain_landings().len(), 1);
        assert!(actor.drain_landings().is_empty());
    }
}
