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

use std::sync::atomic::Ordering;

use super::*;
use crate::test_support::MockProvider;
use khora_core::math::Vec3;
use khora_core::physics::BodyHandle;
use khora_data::actor::{store::ActorStore, ActorDesc};

const EXPIRY: u32 = 3;

fn spawn(store: &mut ActorStore, x: f32) -> Arc<Actor> {
    let body = BodyHandle(store.len() as u64 + 1);
    store.spawn(
        ActorDesc {
            position: Vec3::new(x, 1.0, 0.0),
            ..Default::default()
        },
        body,
    )
}

fn refresh_pass(lane: &LineOfSightLane, provider: &MockProvider, jobs: &JobSystem) {
    lane.reset_cursor();
    lane.refresh(provider, jobs);
}

#[test]
fn test_query_is_symmetric_and_cached() {
    let provider = MockProvider::default();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    assert!(lane.get(&provider, &a, &b));
    assert!(lane.get(&provider, &b, &a));
    assert_eq!(provider.casts(), 1, "the reversed query must hit the cache");
    assert_eq!(lane.len(), 1);
}

#[test]
fn test_blocked_sight() {
    let provider = MockProvider::default();
    provider.blocked.store(true, Ordering::SeqCst);
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    assert!(!lane.get(&provider, &a, &b));
    assert!(!lane.get(&provider, &b, &a));
}

#[test]
fn test_failed_raycast_counts_as_visible() {
    let provider = MockProvider::default();
    provider.failing.store(true, Ordering::SeqCst);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    assert!(has_line_of_sight(&provider, &a, &b));
}

#[test]
fn test_self_query_needs_no_ray() {
    let provider = MockProvider::default();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);

    assert!(lane.get(&provider, &a, &a));
    assert_eq!(provider.casts(), 0);
    assert!(lane.is_empty());
}

#[test]
fn test_refresh_recasts_and_tracks_result() {
    let provider = MockProvider::default();
    let jobs = JobSystem::inline();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    assert!(lane.get(&provider, &a, &b));
    provider.blocked.store(true, Ordering::SeqCst);
    refresh_pass(&lane, &provider, &jobs);

    assert_eq!(provider.casts(), 2);
    assert_eq!(lane.entry_state(a.id(), b.id()), Some((1, false)));
    assert!(!lane.get(&provider, &a, &b));
    assert_eq!(provider.casts(), 2);
}

#[test]
fn test_query_resets_age() {
    let provider = MockProvider::default();
    let jobs = JobSystem::inline();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    lane.get(&provider, &a, &b);
    refresh_pass(&lane, &provider, &jobs);
    refresh_pass(&lane, &provider, &jobs);
    assert_eq!(lane.entry_state(a.id(), b.id()), Some((2, false)));

    lane.get(&provider, &b, &a);
    assert_eq!(lane.entry_state(a.id(), b.id()), Some((0, false)));
}

#[test]
fn test_unqueried_pair_expires_and_is_reaped() {
    let provider = MockProvider::default();
    let jobs = JobSystem::inline();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    lane.get(&provider, &a, &b);
    for _ in 0..EXPIRY {
        refresh_pass(&lane, &provider, &jobs);
        assert_eq!(lane.reap(), 0);
    }
    assert_eq!(lane.len(), 1);

    refresh_pass(&lane, &provider, &jobs);
    assert_eq!(lane.entry_state(a.id(), b.id()).map(|s| s.1), Some(true));
    assert_eq!(lane.reap(), 1);
    assert!(lane.is_empty());
}

#[test]
fn test_dead_actor_pair_is_reaped() {
    let provider = MockProvider::default();
    let jobs = JobSystem::inline();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    lane.get(&provider, &a, &b);
    let b_id = b.id();
    drop(b);
    drop(store.despawn(b_id));

    let casts_before = provider.casts();
    refresh_pass(&lane, &provider, &jobs);
    assert_eq!(provider.casts(), casts_before, "dead pairs are not re-cast");
    assert_eq!(lane.reap(), 1);
    assert!(lane.is_empty());
}

#[test]
fn test_parallel_refresh_claims_every_entry_once() {
    let provider = MockProvider::default();
    let jobs = JobSystem::new(4).unwrap();
    let lane = LineOfSightLane::new(LockingPolicy::AllowSharedLocks, EXPIRY);
    let mut store = ActorStore::new();
    let actors: Vec<_> = (0..12).map(|i| spawn(&mut store, i as f32)).collect();

    for (i, a) in actors.iter().enumerate() {
        for b in &actors[i + 1..] {
            lane.get(&provider, a, b);
        }
    }
    let pairs = lane.len();
    assert_eq!(pairs, 12 * 11 / 2);
    assert_eq!(provider.casts(), pairs);

    refresh_pass(&lane, &provider, &jobs);
    assert_eq!(provider.casts(), 2 * pairs);
    for (i, a) in actors.iter().enumerate() {
        for b in &actors[i + 1..] {
            assert_eq!(lane.entry_state(a.id(), b.id()), Some((1, false)));
        }
    }
}

#[test]
fn test_refresh_without_cursor_reset_does_nothing() {
    let provider = MockProvider::default();
    let jobs = JobSystem::inline();
    let lane = LineOfSightLane::new(LockingPolicy::NoLocks, EXPIRY);
    let mut store = ActorStore::new();
    let a = spawn(&mut store, 0.0);
    let b = spawn(&mut store, 5.0);

    lane.get(&provider, &a, &b);
    refresh_pass(&lane, &provider, &jobs);
    lane.refresh(&provider, &jobs);
    assert_eq!(lane.entry_state(a.id(), b.id()), Some((1, false)));
}
