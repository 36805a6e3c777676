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

use khora_core::math::{Aabb, Vec3};

/// Accumulates line-list geometry for debug rendering.
#[derive(Debug, Default)]
pub(super) struct DebugLines {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u32; 2]>,
}

impl DebugLines {
    pub fn push_line(&mut self, start: Vec3, end: Vec3) {
        let base_idx = self.vertices.len() as u32;
        self.vertices.push(start);
        self.vertices.push(end);
        self.indices.push([base_idx, base_idx + 1]);
    }

    /// Adds the 12 edges of `aabb`, sharing its 8 corners.
    pub fn push_aabb(&mut self, aabb: &Aabb) {
        let base_idx = self.vertices.len() as u32;
        for corner in 0..8u32 {
            let pick = |bit: u32, lo: f32, hi: f32| if corner & bit == 0 { lo } else { hi };
            self.vertices.push(Vec3::new(
                pick(1, aabb.min.x, aabb.max.x),
                pick(2, aabb.min.y, aabb.max.y),
                pick(4, aabb.min.z, aabb.max.z),
            ));
        }
        // Corners differing in exactly one bit share an edge.
        for corner in 0..8u32 {
            for bit in [1u32, 2, 4] {
                if corner & bit == 0 {
                    self.indices.push([base_idx + corner, base_idx + (corner | bit)]);
                }
            }
        }
    }

    pub fn into_parts(self) -> (Vec<Vec3>, Vec<[u32; 2]>) {
        (self.vertices, self.indices)
    }
}
