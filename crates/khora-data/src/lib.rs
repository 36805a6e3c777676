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

//! # Khora Data
//!
//! Data layouts of the physics scheduler: the authoritative game-side
//! [`actor::Actor`] and [`projectile::Projectile`] objects, the generational
//! [`actor::store::ActorStore`] that owns actors, and the per-frame
//! [`simulation::SimulationRegistry`] the scheduler works on.
//!
//! Simulation entries only hold weak references: destroying an object while
//! a frame is in flight makes its entry silently absent.

#![warn(missing_docs)]

pub mod actor;
pub mod projectile;
pub mod simulation;

pub use actor::{store::ActorStore, Actor, ActorDesc, ActorId};
pub use projectile::Projectile;
pub use simulation::{SimulationEntry, SimulationRegistry, SimulationVisitor};
