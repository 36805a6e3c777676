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

//! # Physics Abstractions
//!
//! Contracts between the physics scheduler and its two external collaborators:
//! the rigid-body / collision engine ([`PhysicsProvider`]) and the
//! movement-resolution algorithm ([`movement::MovementSolver`]).
//!
//! Every provider method takes `&self`: the provider is shared by the
//! orchestrator thread and the job system's workers and is responsible for
//! its own thread-safe body reads. Scheduler-side locks protect the
//! simulation registry and visibility cache only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::khora_bitflags;
use crate::math::{Vec3, EPSILON};

pub mod frame;
pub mod movement;

pub use frame::{ActorFrameData, ProjectileFrameData, WorldFrameData};
pub use movement::MovementSolver;

/// Opaque handle to a body in the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Defines the type of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Fixed in place, does not move.
    Static,
    /// Moved by the scheduler (actors, movable platforms).
    Kinematic,
}

/// Supported body shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    /// Axis-aligned box with half-extents.
    Box(Vec3),
}

impl BodyShape {
    /// Half-extents of the shape's bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match self {
            BodyShape::Box(half_extents) => *half_extents,
        }
    }
}

khora_bitflags! {
    /// Collision layers a body belongs to, also used as ray masks.
    pub struct CollisionLayers: u32 {
        /// Static world geometry.
        const WORLD = 1 << 0;
        /// Terrain.
        const HEIGHTMAP = 1 << 1;
        /// Characters.
        const ACTOR = 1 << 2;
        /// Doors and other animated world objects.
        const DOOR = 1 << 3;
        /// Projectiles in flight.
        const PROJECTILE = 1 << 4;
        /// Water volumes.
        const WATER = 1 << 5;
    }
}

impl CollisionLayers {
    /// Layers that block sight between two actors.
    pub const LINE_OF_SIGHT: Self = Self::from_bits_retain(
        Self::WORLD.bits() | Self::HEIGHTMAP.bits() | Self::DOOR.bits(),
    );
}

/// Description for creating a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDesc {
    /// Initial position of the body's center.
    pub position: Vec3,
    /// Collision shape.
    pub shape: BodyShape,
    /// Body type.
    pub body_type: BodyType,
    /// Layers the body belongs to.
    #[serde(skip, default)]
    pub layers: CollisionLayers,
}

impl BodyDesc {
    /// A kinematic box, the usual shape of an actor.
    pub fn actor_box(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            position,
            shape: BodyShape::Box(half_extents),
            body_type: BodyType::Kinematic,
            layers: CollisionLayers::ACTOR,
        }
    }

    /// A static box on the given layers.
    pub fn static_box(position: Vec3, half_extents: Vec3, layers: CollisionLayers) -> Self {
        Self {
            position,
            shape: BodyShape::Box(half_extents),
            body_type: BodyType::Static,
            layers,
        }
    }
}

/// Snapshot of a body read under the engine's body lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Center position.
    pub position: Vec3,
    /// Half-extents of the body's bounding box.
    pub half_extents: Vec3,
}

/// Read guard returned by [`PhysicsProvider::lock_body_read`].
///
/// The body cannot be mutated while the guard is alive.
pub trait BodyRead {
    /// The handle of the locked body.
    fn handle(&self) -> BodyHandle;
    /// Current pose of the body.
    fn pose(&self) -> BodyPose;
    /// Whether the body is currently part of the simulated world.
    fn is_active(&self) -> bool;
}

/// A ray with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray from `from` towards `to`, returning the ray and the
    /// distance to travel, or `None` if both points coincide.
    pub fn between(from: Vec3, to: Vec3) -> Option<(Self, f32)> {
        let delta = to - from;
        let distance = delta.length();
        if distance < EPSILON {
            return None;
        }
        Some((
            Self {
                origin: from,
                direction: delta / distance,
            },
            distance,
        ))
    }

    /// Point reached after travelling `toi` along the ray.
    #[inline]
    pub fn point_at(&self, toi: f32) -> Vec3 {
        self.origin + self.direction * toi
    }
}

/// Which bodies a ray may hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayFilter {
    /// Layers the ray collides with.
    pub mask: CollisionLayers,
    /// Bodies skipped by the query, e.g. the caster.
    pub exclude: [Option<BodyHandle>; 2],
}

impl RayFilter {
    /// A filter colliding with `mask` only.
    pub fn new(mask: CollisionLayers) -> Self {
        Self {
            mask,
            exclude: [None, None],
        }
    }

    /// Returns the filter with `body` excluded.
    #[must_use]
    pub fn excluding(mut self, body: BodyHandle) -> Self {
        match self.exclude {
            [None, _] => self.exclude[0] = Some(body),
            _ => self.exclude[1] = Some(body),
        }
        self
    }

    /// Whether a body on `layers` with `handle` is eligible for a hit.
    pub fn accepts(&self, handle: BodyHandle, layers: CollisionLayers) -> bool {
        layers.intersects(self.mask) && !self.exclude.contains(&Some(handle))
    }
}

/// The closest hit of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The body that was hit.
    pub body: BodyHandle,
    /// World-space point of impact.
    pub point: Vec3,
    /// Distance travelled along the ray.
    pub toi: f32,
}

/// Errors that can occur during a ray query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RaycastError {
    /// The ray direction is zero or not normalised.
    #[error("ray direction is degenerate: {0:?}")]
    DegenerateDirection(Vec3),
    /// An input is NaN or infinite.
    #[error("ray query has non-finite input")]
    NonFinite,
}

/// Interface contract for any physics engine implementation.
pub trait PhysicsProvider: Send + Sync {
    /// Creates a body. It does not take part in queries until added.
    fn create_body(&self, desc: &BodyDesc) -> BodyHandle;

    /// Adds a created body to the simulated world, optionally activating it.
    fn add_body(&self, handle: BodyHandle, activate: bool);

    /// Removes a body from the simulated world without destroying it.
    fn remove_body(&self, handle: BodyHandle);

    /// Destroys a body. The handle is invalid afterwards.
    fn destroy_body(&self, handle: BodyHandle);

    /// Locks a body for reading. Returns `None` for unknown handles.
    fn lock_body_read(&self, handle: BodyHandle) -> Option<Box<dyn BodyRead + '_>>;

    /// Moves a body to `position`.
    fn set_body_pose(&self, handle: BodyHandle, position: Vec3);

    /// Refreshes a body's broadphase bounds after it moved.
    fn update_aabb(&self, handle: BodyHandle);

    /// Casts `ray` up to `max_toi` and returns the closest accepted hit.
    fn cast_ray(
        &self,
        ray: &Ray,
        max_toi: f32,
        filter: &RayFilter,
    ) -> Result<Option<RaycastHit>, RaycastError>;

    /// Line-list geometry of the world for debug drawing.
    fn debug_render_data(&self) -> (Vec<Vec3>, Vec<[u32; 2]>);
}

/// Receives debug geometry from [`PhysicsProvider::debug_render_data`].
pub trait DebugDrawer {
    /// Draws a list of line segments indexing into `vertices`.
    fn draw_lines(&mut self, vertices: &[Vec3], indices: &[[u32; 2]]);
}
