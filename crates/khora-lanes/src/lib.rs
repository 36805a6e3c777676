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

//! # Khora Lanes
//!
//! Hot-path strategies composed by the physics agent:
//!
//! - [`physics_lane`]: the simulation visitors and the per-step movement
//!   dispatch over the job system, plus debug drawing.
//! - [`visibility_lane`]: the incrementally refreshed line-of-sight cache.

#![warn(missing_docs)]

pub mod physics_lane;
pub mod visibility_lane;

#[cfg(test)]
mod test_support;
