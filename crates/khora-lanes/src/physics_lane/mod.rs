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

//! Physics Lane
//!
//! Runs the fixed steps of a physics frame over a simulation registry: a
//! pre-step pass on the orchestrator thread, one movement job per entry on
//! the job system, then a post-step pass publishing resolved positions.

mod movement_lane;
mod physics_debug_lane;
pub mod visitors;

pub use movement_lane::*;
pub use physics_debug_lane::*;
