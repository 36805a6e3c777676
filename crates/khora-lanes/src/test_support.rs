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

//! Scripted collaborators for lane tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use khora_core::math::Vec3;
use khora_core::physics::{
    ActorFrameData, BodyDesc, BodyHandle, BodyRead, MovementSolver, PhysicsProvider, Ray,
    RayFilter, RaycastError, RaycastHit, WorldFrameData,
};

/// A provider whose ray queries are scripted and counted.
#[derive(Default)]
pub(crate) struct MockProvider {
    pub casts: AtomicUsize,
    pub blocked: AtomicBool,
    pub failing: AtomicBool,
    pub aabb_updates: AtomicUsize,
    pub poses: Mutex<HashMap<BodyHandle, Vec3>>,
    next_id: AtomicU64,
}

impl MockProvider {
    pub fn casts(&self) -> usize {
        self.casts.load(Ordering::SeqCst)
    }

    pub fn pose(&self, body: BodyHandle) -> Option<Vec3> {
        self.poses.lock().unwrap().get(&body).copied()
    }
}

impl PhysicsProvider for MockProvider {
    fn create_body(&self, _desc: &BodyDesc) -> BodyHandle {
        BodyHandle(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn add_body(&self, _handle: BodyHandle, _activate: bool) {}

    fn remove_body(&self, _handle: BodyHandle) {}

    fn destroy_body(&self, _handle: BodyHandle) {}

    fn lock_body_read(&self, _handle: BodyHandle) -> Option<Box<dyn BodyRead + '_>> {
        None
    }

    fn set_body_pose(&self, handle: BodyHandle, position: Vec3) {
        self.poses.lock().unwrap().insert(handle, position);
    }

    fn update_aabb(&self, _handle: BodyHandle) {
        self.aabb_updates.fetch_add(1, Ordering::SeqCst);
    }

    fn cast_ray(
        &self,
        ray: &Ray,
        _max_toi: f32,
        _filter: &RayFilter,
    ) -> Result<Option<RaycastHit>, RaycastError> {
        self.casts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RaycastError::NonFinite);
        }
        if self.blocked.load(Ordering::SeqCst) {
            return Ok(Some(RaycastHit {
                body: BodyHandle(u64::MAX),
                point: ray.origin,
                toi: 0.0,
            }));
        }
        Ok(None)
    }

    fn debug_render_data(&self) -> (Vec<Vec3>, Vec<[u32; 2]>) {
        (vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1], [1, 2]])
    }
}

/// Moves actors by their requested movement, counting unstick calls.
#[derive(Default)]
pub(crate) struct LinearSolver {
    pub unsticks: AtomicUsize,
}

impl MovementSolver for LinearSolver {
    fn unstick(&self, _frame: &mut ActorFrameData, _provider: &dyn PhysicsProvider) {
        self.unsticks.fetch_add(1, Ordering::SeqCst);
    }

    fn move_actor(
        &self,
        frame: &mut ActorFrameData,
        dt: f32,
        _provider: &dyn PhysicsProvider,
        _world: &WorldFrameData,
    ) {
        frame.position += frame.movement * dt;
    }
}
