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

//! Generational storage owning every live actor.

use std::sync::Arc;

use khora_core::physics::BodyHandle;

use super::{Actor, ActorDesc, ActorId};

/// Owns the actors of a scene.
///
/// Slots of despawned actors are recycled through a free list with their
/// generation bumped, so stale [`ActorId`]s stop resolving.
#[derive(Debug, Default)]
pub struct ActorStore {
    /// Every slot ever created, with its current id and live actor, if any.
    slots: Vec<(ActorId, Option<Arc<Actor>>)>,
    /// Slot indices available for reuse.
    freed: Vec<u32>,
}

impl ActorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an actor backed by `body` and returns a strong handle to it.
    pub fn spawn(&mut self, desc: ActorDesc, body: BodyHandle) -> Arc<Actor> {
        let id = if let Some(index) = self.freed.pop() {
            let (slot_id, _) = &mut self.slots[index as usize];
            slot_id.generation += 1;
            *slot_id
        } else {
            let id = ActorId {
                index: self.slots.len() as u32,
                generation: 0,
            };
            self.slots.push((id, None));
            id
        };

        let actor = Arc::new(Actor::new(id, desc, body));
        self.slots[id.index as usize].1 = Some(Arc::clone(&actor));
        log::debug!("ActorStore: spawned {} '{}'", id, actor.name());
        actor
    }

    /// Removes an actor from the store, returning it.
    ///
    /// Once the returned handle and any other strong reference are dropped,
    /// every weak reference held by simulations expires.
    pub fn despawn(&mut self, id: ActorId) -> Option<Arc<Actor>> {
        let (slot_id, slot) = self.slots.get_mut(id.index as usize)?;
        if slot_id.generation != id.generation {
            return None;
        }
        let actor = slot.take()?;
        self.freed.push(id.index);
        log::debug!("ActorStore: despawned {}", id);
        Some(actor)
    }

    /// Returns the live actor with `id`.
    pub fn get(&self, id: ActorId) -> Option<&Arc<Actor>> {
        self.slots
            .get(id.index as usize)
            .and_then(|(slot_id, actor)| {
                if slot_id.generation == id.generation {
                    actor.as_ref()
                } else {
                    None
                }
            })
    }

    /// Iterates over live actors in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Actor>> {
        self.slots.iter().filter_map(|(_, actor)| actor.as_ref())
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.slots.len() - self.freed.len()
    }

    /// Whether no actor is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_get() {
        let mut store = ActorStore::new();
        let a = store.spawn(ActorDesc::default(), BodyHandle(1));
        let b = store.spawn(ActorDesc::default(), BodyHandle(2));
        assert_eq!(store.len(), 2);
        assert_ne!(a.id(), b.id());
        assert_eq!(store.get(a.id()).map(|x| x.body()), Some(BodyHandle(1)));
    }

    #[test]
    fn test_recycled_slot_bumps_generation() {
        let mut store = ActorStore::new();
        let first = store.spawn(ActorDesc::default(), BodyHandle(1)).id();
        assert!(store.despawn(first).is_some());
        assert!(store.despawn(first).is_none());
        assert!(store.is_empty());

        let second = store.spawn(ActorDesc::default(), BodyHandle(2)).id();
        assert_eq!(second.index, first.index);
        assert_eq!(second.generation, first.generation + 1);
        assert!(store.get(first).is_none());
        assert!(store.get(second).is_some());
    }

    #[test]
    fn test_despawn_expires_weak_handles() {
        let mut store = ActorStore::new();
        let actor = store.spawn(ActorDesc::default(), BodyHandle(1));
        let weak = Arc::downgrade(&actor);
        drop(actor);
        assert!(weak.upgrade().is_some());

        let id = weak.upgrade().map(|a| a.id()).unwrap();
        drop(store.despawn(id));
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_iter_skips_dead_slots() {
        let mut store = ActorStore::new();
        let ids: Vec<_> = (0..3)
            .map(|i| store.spawn(ActorDesc::default(), BodyHandle(i)).id())
            .collect();
        store.despawn(ids[1]);
        let bodies: Vec<_> = store.iter().map(|a| a.body()).collect();
        assert_eq!(bodies, vec![BodyHandle(0), BodyHandle(2)]);
    }
}
