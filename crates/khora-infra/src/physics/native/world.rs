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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use khora_core::math::{Aabb, Vec3};
use khora_core::physics::{
    BodyDesc, BodyHandle, BodyPose, BodyRead, BodyType, CollisionLayers, PhysicsProvider, Ray,
    RayFilter, RaycastError, RaycastHit,
};

use super::debug::DebugLines;

/// Tolerance on the length of a ray direction.
const DIRECTION_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone)]
struct NativeBody {
    position: Vec3,
    half_extents: Vec3,
    body_type: BodyType,
    layers: CollisionLayers,
    /// Bounds used by queries; lags `position` until `update_aabb`.
    aabb: Aabb,
    added: bool,
    active: bool,
}

/// A thread-safe world of axis-aligned boxes.
///
/// Queries take a shared lock on the body table, mutations an exclusive one,
/// so any number of movement jobs can cast rays at once.
#[derive(Debug)]
pub struct NativePhysicsWorld {
    bodies: RwLock<HashMap<BodyHandle, NativeBody>>,
    next_handle: AtomicU64,
}

impl Default for NativePhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl NativePhysicsWorld {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self {
            bodies: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Creates a body and adds it in one go.
    pub fn spawn(&self, desc: &BodyDesc) -> BodyHandle {
        let handle = self.create_body(desc);
        self.add_body(handle, true);
        handle
    }

    /// Number of bodies, added or not.
    pub fn body_count(&self) -> usize {
        self.read_bodies().len()
    }

    /// Current position of a body.
    pub fn body_position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.read_bodies().get(&handle).map(|body| body.position)
    }

    fn read_bodies(&self) -> RwLockReadGuard<'_, HashMap<BodyHandle, NativeBody>> {
        self.bodies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_bodies(&self) -> RwLockWriteGuard<'_, HashMap<BodyHandle, NativeBody>> {
        self.bodies.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_body(&self, handle: BodyHandle, f: impl FnOnce(&mut NativeBody)) {
        match self.write_bodies().get_mut(&handle) {
            Some(body) => f(body),
            None => log::warn!("NativePhysicsWorld: unknown body {handle:?}"),
        }
    }
}

/// Read access to one body, holding the world's shared lock.
struct NativeBodyRead<'a> {
    bodies: RwLockReadGuard<'a, HashMap<BodyHandle, NativeBody>>,
    handle: BodyHandle,
}

impl NativeBodyRead<'_> {
    fn body(&self) -> &NativeBody {
        // Presence was checked before the guard was handed out and the table
        // cannot change while it is held.
        &self.bodies[&self.handle]
    }
}

impl BodyRead for NativeBodyRead<'_> {
    fn handle(&self) -> BodyHandle {
        self.handle
    }

    fn pose(&self) -> BodyPose {
        let body = self.body();
        BodyPose {
            position: body.position,
            half_extents: body.half_extents,
        }
    }

    fn is_active(&self) -> bool {
        let body = self.body();
        body.added && body.active
    }
}

impl PhysicsProvider for NativePhysicsWorld {
    fn create_body(&self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let half_extents = desc.shape.half_extents();
        let body = NativeBody {
            position: desc.position,
            half_extents,
            body_type: desc.body_type,
            layers: desc.layers,
            aabb: Aabb::from_center_half_extents(desc.position, half_extents),
            added: false,
            active: false,
        };
        self.write_bodies().insert(handle, body);
        handle
    }

    fn add_body(&self, handle: BodyHandle, activate: bool) {
        self.with_body(handle, |body| {
            body.added = true;
            body.active = activate || body.body_type == BodyType::Static;
        });
    }

    fn remove_body(&self, handle: BodyHandle) {
        self.with_body(handle, |body| {
            body.added = false;
            body.active = false;
        });
    }

    fn destroy_body(&self, handle: BodyHandle) {
        if self.write_bodies().remove(&handle).is_none() {
            log::warn!("NativePhysicsWorld: destroying unknown body {handle:?}");
        }
    }

    fn lock_body_read(&self, handle: BodyHandle) -> Option<Box<dyn BodyRead + '_>> {
        let bodies = self.read_bodies();
        if !bodies.contains_key(&handle) {
            return None;
        }
        Some(Box::new(NativeBodyRead { bodies, handle }))
    }

    fn set_body_pose(&self, handle: BodyHandle, position: Vec3) {
        self.with_body(handle, |body| body.position = position);
    }

    fn update_aabb(&self, handle: BodyHandle) {
        self.with_body(handle, |body| {
            body.aabb = Aabb::from_center_half_extents(body.position, body.half_extents);
        });
    }

    fn cast_ray(
        &self,
        ray: &Ray,
        max_toi: f32,
        filter: &RayFilter,
    ) -> Result<Option<RaycastHit>, RaycastError> {
        if !ray.origin.is_finite() || !ray.direction.is_finite() || max_toi.is_nan() {
            return Err(RaycastError::NonFinite);
        }
        if (ray.direction.length() - 1.0).abs() > DIRECTION_TOLERANCE {
            return Err(RaycastError::DegenerateDirection(ray.direction));
        }

        let bodies = self.read_bodies();
        let closest = bodies
            .iter()
            .filter(|(handle, body)| body.added && filter.accepts(**handle, body.layers))
            .filter_map(|(handle, body)| {
                body.aabb
                    .ray_intersection(ray.origin, ray.direction, max_toi)
                    .map(|toi| (toi, *handle))
            })
            // Ties go to the lowest handle so results do not depend on map order.
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Ok(closest.map(|(toi, body)| RaycastHit {
            body,
            point: ray.point_at(toi),
            toi,
        }))
    }

    fn debug_render_data(&self) -> (Vec<Vec3>, Vec<[u32; 2]>) {
        let bodies = self.read_bodies();
        let mut handles: Vec<_> = bodies
            .iter()
            .filter(|(_, body)| body.added)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort_unstable();

        let mut lines = DebugLines::default();
        for handle in handles {
            lines.push_aabb(&bodies[&handle].aabb);
        }
        lines.into_parts()
    }
}
