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

//! Simulation entries and the per-frame simulation registry.
//!
//! A [`SimulationEntry`] pairs a weak reference to a game object with the
//! frame-local working data the movement solver mutates. Entries form a
//! closed set of kinds; operations over them are written as
//! [`SimulationVisitor`]s.

use std::sync::{Arc, Weak};

use khora_core::physics::{ActorFrameData, ProjectileFrameData};

use crate::actor::{store::ActorStore, Actor};
use crate::projectile::Projectile;

/// Simulation of one actor.
#[derive(Debug)]
pub struct ActorSimulation {
    actor: Weak<Actor>,
    frame: ActorFrameData,
}

impl ActorSimulation {
    /// Creates the simulation of `actor` with working data seeded from its
    /// current position.
    pub fn new(actor: &Arc<Actor>) -> Self {
        Self {
            actor: Arc::downgrade(actor),
            frame: ActorFrameData::new(actor.body(), actor.position(), actor.half_extents()),
        }
    }

    /// Working data of the current frame.
    pub fn frame(&self) -> &ActorFrameData {
        &self.frame
    }
}

/// Simulation of one projectile.
#[derive(Debug)]
pub struct ProjectileSimulation {
    projectile: Weak<Projectile>,
    frame: ProjectileFrameData,
}

impl ProjectileSimulation {
    /// Creates the simulation of `projectile`.
    pub fn new(projectile: &Arc<Projectile>) -> Self {
        let state = projectile.state();
        let frame = ProjectileFrameData {
            position: state.position,
            velocity: state.velocity,
            mask: projectile.mask(),
            caster: projectile.caster(),
            hit: state.hit,
        };
        drop(state);
        Self {
            projectile: Arc::downgrade(projectile),
            frame,
        }
    }

    /// Working data of the current frame.
    pub fn frame(&self) -> &ProjectileFrameData {
        &self.frame
    }
}

/// One simulated object.
#[derive(Debug)]
pub enum SimulationEntry {
    /// A character.
    Actor(ActorSimulation),
    /// A projectile.
    Projectile(ProjectileSimulation),
}

/// Exclusive access to a live entry: a strong reference to the object and
/// a mutable borrow of its working data.
#[derive(Debug)]
pub enum LockedSimulation<'a> {
    /// A locked actor simulation.
    Actor {
        /// The simulated actor, kept alive while locked.
        actor: Arc<Actor>,
        /// Its working data.
        frame: &'a mut ActorFrameData,
    },
    /// A locked projectile simulation.
    Projectile {
        /// The simulated projectile, kept alive while locked.
        projectile: Arc<Projectile>,
        /// Its working data.
        frame: &'a mut ProjectileFrameData,
    },
}

/// An operation over every kind of simulation entry.
pub trait SimulationVisitor {
    /// Visits a live actor simulation.
    fn visit_actor(&mut self, actor: &Actor, frame: &mut ActorFrameData);

    /// Visits a live projectile simulation.
    fn visit_projectile(&mut self, projectile: &Projectile, frame: &mut ProjectileFrameData);
}

impl SimulationEntry {
    /// Simulation entry of `actor`.
    pub fn actor(actor: &Arc<Actor>) -> Self {
        SimulationEntry::Actor(ActorSimulation::new(actor))
    }

    /// Simulation entry of `projectile`.
    pub fn projectile(projectile: &Arc<Projectile>) -> Self {
        SimulationEntry::Projectile(ProjectileSimulation::new(projectile))
    }

    /// Locks the entry. Returns `None` if the simulated object was destroyed.
    pub fn lock(&mut self) -> Option<LockedSimulation<'_>> {
        match self {
            SimulationEntry::Actor(sim) => {
                let actor = sim.actor.upgrade()?;
                Some(LockedSimulation::Actor {
                    actor,
                    frame: &mut sim.frame,
                })
            }
            SimulationEntry::Projectile(sim) => {
                let projectile = sim.projectile.upgrade()?;
                Some(LockedSimulation::Projectile {
                    projectile,
                    frame: &mut sim.frame,
                })
            }
        }
    }

    /// Whether the simulated object is still alive.
    pub fn is_alive(&self) -> bool {
        match self {
            SimulationEntry::Actor(sim) => sim.actor.strong_count() > 0,
            SimulationEntry::Projectile(sim) => sim.projectile.strong_count() > 0,
        }
    }
}

impl LockedSimulation<'_> {
    /// Dispatches to the visitor method matching this entry's kind.
    pub fn accept<V: SimulationVisitor + ?Sized>(self, visitor: &mut V) {
        match self {
            LockedSimulation::Actor { actor, frame } => visitor.visit_actor(&actor, frame),
            LockedSimulation::Projectile { projectile, frame } => {
                visitor.visit_projectile(&projectile, frame)
            }
        }
    }
}

/// The set of simulations handed to the scheduler for one frame.
#[derive(Debug, Default)]
pub struct SimulationRegistry {
    entries: Vec<SimulationEntry>,
}

impl SimulationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry simulating every live actor of `store`.
    pub fn from_actors(store: &ActorStore) -> Self {
        store.iter().map(SimulationEntry::actor).collect()
    }

    /// Adds a simulation entry.
    pub fn push(&mut self, entry: SimulationEntry) {
        self.entries.push(entry);
    }

    /// Adds the simulation of `projectile`.
    pub fn add_projectile(&mut self, projectile: &Arc<Projectile>) {
        self.push(SimulationEntry::projectile(projectile));
    }

    /// Number of entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose object is still alive.
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_alive()).count()
    }

    /// All entries, for distribution over a job system.
    pub fn entries_mut(&mut self) -> &mut [SimulationEntry] {
        &mut self.entries
    }

    /// All entries.
    pub fn iter(&self) -> std::slice::Iter<'_, SimulationEntry> {
        self.entries.iter()
    }

    /// Runs `visitor` over every live entry, in order, and returns how many
    /// were visited. Destroyed objects are skipped.
    pub fn visit<V: SimulationVisitor + ?Sized>(&mut self, visitor: &mut V) -> usize {
        let mut visited = 0;
        for entry in &mut self.entries {
            if let Some(locked) = entry.lock() {
                locked.accept(visitor);
                visited += 1;
            }
        }
        visited
    }
}

impl FromIterator<SimulationEntry> for SimulationRegistry {
    fn from_iter<I: IntoIterator<Item = SimulationEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorDesc;
    use khora_core::math::Vec3;
    use khora_core::physics::{BodyHandle, CollisionLayers};

    #[derive(Default)]
    struct CountingVisitor {
        actors: usize,
        projectiles: usize,
    }

    impl SimulationVisitor for CountingVisitor {
        fn visit_actor(&mut self, _actor: &Actor, frame: &mut ActorFrameData) {
            self.actors += 1;
            frame.stuck_frames += 1;
        }

        fn visit_projectile(&mut self, _projectile: &Projectile, _frame: &mut ProjectileFrameData) {
            self.projectiles += 1;
        }
    }

    #[test]
    fn test_lock_after_despawn_is_absent() {
        let mut store = ActorStore::new();
        let actor = store.spawn(ActorDesc::default(), BodyHandle(7));
        let mut entry = SimulationEntry::actor(&actor);
        assert!(entry.lock().is_some());

        let id = actor.id();
        drop(actor);
        drop(store.despawn(id));
        assert!(!entry.is_alive());
        assert!(entry.lock().is_none());
    }

    #[test]
    fn test_visit_skips_dead_entries() {
        let mut store = ActorStore::new();
        let a = store.spawn(ActorDesc::default(), BodyHandle(1));
        let b = store.spawn(ActorDesc::default(), BodyHandle(2));
        let projectile = Arc::new(Projectile::new(
            Vec3::ZERO,
            Vec3::X,
            CollisionLayers::WORLD,
            None,
        ));

        let mut registry = SimulationRegistry::from_actors(&store);
        registry.add_projectile(&projectile);
        assert_eq!(registry.len(), 3);

        let b_id = b.id();
        drop(b);
        drop(store.despawn(b_id));
        assert_eq!(registry.live_count(), 2);

        let mut visitor = CountingVisitor::default();
        assert_eq!(registry.visit(&mut visitor), 2);
        assert_eq!(visitor.actors, 1);
        assert_eq!(visitor.projectiles, 1);
        drop(a);
    }

    #[test]
    fn test_frame_data_is_seeded_from_actor() {
        let mut store = ActorStore::new();
        let actor = store.spawn(
            ActorDesc {
                position: Vec3::new(1.0, 2.0, 3.0),
                ..Default::default()
            },
            BodyHandle(4),
        );
        let entry = SimulationEntry::actor(&actor);
        let SimulationEntry::Actor(sim) = &entry else {
            panic!("expected an actor entry");
        };
        assert_eq!(sim.frame().body, BodyHandle(4));
        assert_eq!(sim.frame().position, Vec3::new(1.0, 2.0, 3.0));
    }
}
