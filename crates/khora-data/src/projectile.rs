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

//! Projectiles: fast objects moved by swept rays.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use khora_core::math::Vec3;
use khora_core::physics::{BodyHandle, CollisionLayers, RaycastHit};

/// Authoritative game-side state of a projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileState {
    /// Current position.
    pub position: Vec3,
    /// Position before the last physics update, for interpolation.
    pub previous_position: Vec3,
    /// Interpolated position to render this frame.
    pub render_position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// First hit, once the projectile struck something.
    pub hit: Option<RaycastHit>,
}

/// A projectile in flight. Owned by game logic through an `Arc`.
#[derive(Debug)]
pub struct Projectile {
    mask: CollisionLayers,
    caster: Option<BodyHandle>,
    state: RwLock<ProjectileState>,
}

impl Projectile {
    /// Fires a projectile from `position` with `velocity`, colliding with
    /// `mask` and never hitting `caster`.
    pub fn new(
        position: Vec3,
        velocity: Vec3,
        mask: CollisionLayers,
        caster: Option<BodyHandle>,
    ) -> Self {
        Self {
            mask,
            caster,
            state: RwLock::new(ProjectileState {
                position,
                previous_position: position,
                render_position: position,
                velocity,
                hit: None,
            }),
        }
    }

    /// Layers the projectile collides with.
    pub fn mask(&self) -> CollisionLayers {
        self.mask
    }

    /// The body that fired the projectile.
    pub fn caster(&self) -> Option<BodyHandle> {
        self.caster
    }

    /// Read access to the projectile's state.
    pub fn state(&self) -> RwLockReadGuard<'_, ProjectileState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Write access to the projectile's state.
    pub fn state_mut(&self) -> RwLockWriteGuard<'_, ProjectileState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.state().position
    }

    /// The first hit, if any.
    pub fn hit(&self) -> Option<RaycastHit> {
        self.state().hit
    }
}
