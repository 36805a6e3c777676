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

//! Visibility Lane
//!
//! A cache of line-of-sight results between actor pairs.
//!
//! Queries are symmetric and answered from the cache when possible; a miss
//! casts a ray immediately and inserts the pair. Once per physics frame
//! every cached pair is re-cast by the job system's workers, which claim
//! entries through a single atomic counter. Pairs nobody asked about for
//! more than `expiry` refreshes, or whose actors were destroyed, are marked
//! stale and erased by [`LineOfSightLane::reap`].

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use khora_core::jobs::JobSystem;
use khora_core::lane::{Lane, LaneKind};
use khora_core::physics::{CollisionLayers, PhysicsProvider, Ray, RayFilter};
use khora_core::sync::{LockingPolicy, PolicyLock};
use khora_data::actor::{Actor, ActorId};

/// Casts a ray between the eyes of `a` and `b`.
///
/// Only world geometry, terrain and doors block sight. A failed query is
/// treated as "nothing in between".
pub fn has_line_of_sight(provider: &dyn PhysicsProvider, a: &Actor, b: &Actor) -> bool {
    let Some((ray, distance)) = Ray::between(a.eye_position(), b.eye_position()) else {
        return true;
    };
    let filter = RayFilter::new(CollisionLayers::LINE_OF_SIGHT)
        .excluding(a.body())
        .excluding(b.body());

    match provider.cast_ray(&ray, distance, &filter) {
        Ok(hit) => hit.is_none(),
        Err(e) => {
            log::warn!("LOS: raycast between {} and {} failed: {e}", a.id(), b.id());
            true
        }
    }
}

/// Unordered pair key: the smaller id first.
fn pair_key(a: ActorId, b: ActorId) -> (ActorId, ActorId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A cached line-of-sight result between two actors.
#[derive(Debug)]
pub struct LosRequest {
    key: (ActorId, ActorId),
    actors: [Weak<Actor>; 2],
    result: AtomicBool,
    age: AtomicU32,
    stale: AtomicBool,
}

impl LosRequest {
    fn new(a: &Arc<Actor>, b: &Arc<Actor>, result: bool) -> Self {
        Self {
            key: pair_key(a.id(), b.id()),
            actors: [Arc::downgrade(a), Arc::downgrade(b)],
            result: AtomicBool::new(result),
            age: AtomicU32::new(0),
            stale: AtomicBool::new(false),
        }
    }

    /// The unordered pair of actors, smaller id first.
    pub fn key(&self) -> (ActorId, ActorId) {
        self.key
    }

    /// Last computed result.
    pub fn result(&self) -> bool {
        self.result.load(Ordering::Relaxed)
    }

    /// Refreshes since the pair was last queried.
    pub fn age(&self) -> u32 {
        self.age.load(Ordering::Relaxed)
    }

    /// Whether the entry awaits removal.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Relaxed)
    }
}

/// The line-of-sight cache.
#[derive(Debug)]
pub struct LineOfSightLane {
    requests: PolicyLock<Vec<LosRequest>>,
    cursor: AtomicUsize,
    expiry: u32,
}

impl LineOfSightLane {
    /// Creates an empty cache dropping pairs unqueried for more than
    /// `expiry` refreshes.
    pub fn new(policy: LockingPolicy, expiry: u32) -> Self {
        Self {
            requests: PolicyLock::new(policy, Vec::new()),
            cursor: AtomicUsize::new(0),
            expiry,
        }
    }

    /// Whether `a` and `b` see each other.
    ///
    /// Symmetric. A cached answer is returned as is and marks the pair
    /// fresh again; otherwise a ray is cast and the pair starts being cached.
    pub fn get(&self, provider: &dyn PhysicsProvider, a: &Arc<Actor>, b: &Arc<Actor>) -> bool {
        let key = pair_key(a.id(), b.id());
        if key.0 == key.1 {
            return true;
        }

        if let Some(result) = self.lookup(key) {
            return result;
        }

        // Cast without holding the cache lock.
        let result = has_line_of_sight(provider, a, b);

        let mut requests = self.requests.write();
        // Another caller may have inserted the pair in the meantime.
        match requests.iter().find(|r| r.key == key) {
            Some(existing) => existing.result.store(result, Ordering::Relaxed),
            None => requests.push(LosRequest::new(a, b, result)),
        }
        result
    }

    fn lookup(&self, key: (ActorId, ActorId)) -> Option<bool> {
        let requests = self.requests.write();
        let request = requests.iter().find(|r| r.key == key)?;
        request.age.store(0, Ordering::Relaxed);
        Some(request.result())
    }

    /// Rewinds the work-claiming counter. Must run before each refresh.
    pub fn reset_cursor(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// Re-casts every cached pair on the job system's workers.
    ///
    /// Each worker claims entries through the shared counter until none
    /// remain, so every entry is refreshed exactly once per call.
    pub fn refresh(&self, provider: &dyn PhysicsProvider, jobs: &JobSystem) {
        let requests = self.requests.read();
        let requests: &[LosRequest] = &requests;
        if requests.is_empty() {
            return;
        }

        jobs.broadcast(|_worker| loop {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed);
            let Some(request) = requests.get(index) else {
                break;
            };
            self.refresh_request(provider, request);
        });
    }

    fn refresh_request(&self, provider: &dyn PhysicsProvider, request: &LosRequest) {
        let age = request.age.fetch_add(1, Ordering::Relaxed) + 1;
        if age > self.expiry {
            request.stale.store(true, Ordering::Relaxed);
            return;
        }

        let [a, b] = &request.actors;
        match (a.upgrade(), b.upgrade()) {
            (Some(a), Some(b)) => request
                .result
                .store(has_line_of_sight(provider, &a, &b), Ordering::Relaxed),
            _ => request.stale.store(true, Ordering::Relaxed),
        }
    }

    /// Erases stale entries and returns how many were removed.
    pub fn reap(&self) -> usize {
        let mut requests = self.requests.write();
        let before = requests.len();
        requests.retain(|r| !r.is_stale());
        let removed = before - requests.len();
        if removed > 0 {
            log::trace!("LOS: reaped {removed} stale pair(s), {} left", requests.len());
        }
        removed
    }

    /// Drops every cached pair.
    pub fn clear(&self) {
        self.requests.write().clear();
    }

    /// Number of cached pairs.
    pub fn len(&self) -> usize {
        self.requests.read().len()
    }

    /// Whether no pair is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Age and staleness of the cached pair of `a` and `b`, if any.
    pub fn entry_state(&self, a: ActorId, b: ActorId) -> Option<(u32, bool)> {
        let key = pair_key(a, b);
        let requests = self.requests.read();
        requests
            .iter()
            .find(|r| r.key == key)
            .map(|r| (r.age(), r.is_stale()))
    }
}

impl Lane for LineOfSightLane {
    fn strategy_name(&self) -> &'static str {
        "LineOfSightCache"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Visibility
    }
}

#[cfg(test)]
mod tests;
