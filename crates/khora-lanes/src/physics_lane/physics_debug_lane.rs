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

use khora_core::lane::{Lane, LaneKind};
use khora_core::physics::{DebugDrawer, PhysicsProvider};

/// A lane dedicated to forwarding debug geometry from the physics engine.
#[derive(Debug, Default)]
pub struct PhysicsDebugLane;

impl PhysicsDebugLane {
    /// Creates a new `PhysicsDebugLane`.
    pub fn new() -> Self {
        Self
    }

    /// Hands the engine's debug lines to `drawer` and returns how many were drawn.
    pub fn draw(&self, provider: &dyn PhysicsProvider, drawer: &mut dyn DebugDrawer) -> usize {
        let (vertices, indices) = provider.debug_render_data();
        if indices.is_empty() {
            return 0;
        }
        drawer.draw_lines(&vertices, &indices);
        indices.len()
    }
}

impl Lane for PhysicsDebugLane {
    fn strategy_name(&self) -> &'static str {
        "PhysicsDebug"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Debug
    }
}
