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

//! # Khora Agents
//!
//! Agents own the lanes of a subsystem and decide, frame by frame, how they
//! run. The [`physics_agent::PhysicsAgent`] is the physics task scheduler:
//! it plans the steps of each frame, fans movement out over the job system,
//! keeps the line-of-sight cache fresh and publishes results back.

#![warn(missing_docs)]

pub mod physics_agent;
