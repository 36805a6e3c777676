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

use khora_control::RingBuffer;

/// Number of frames kept in the physics time history.
pub const STATS_HISTORY: usize = 32;

/// What the physics agent did during the last frame.
#[derive(Debug, Clone, Default)]
pub struct PhysicsFrameStats {
    /// Frames prepared since the agent was created.
    pub frame_number: u64,
    /// Steps run this frame.
    pub steps: u32,
    /// Duration of each step, in seconds.
    pub step_delta: f32,
    /// Wall time from the start of the frame to the end of its simulation.
    pub physics_seconds: f32,
    /// Time spent stepping on the job system.
    pub worker_seconds: f32,
    /// Simulations registered this frame.
    pub simulations: usize,
    /// Simulations whose object was alive when the frame synced.
    pub live_simulations: usize,
    /// Cached line-of-sight pairs after the post-simulation reap.
    pub los_entries: usize,
    /// Cached pairs dropped this frame.
    pub los_reaped: usize,
    /// Landings recorded by the last sync.
    pub landings: usize,
    history: RingBuffer<f32, STATS_HISTORY>,
}

impl PhysicsFrameStats {
    /// Records the physics time of a frame that ran steps.
    pub(crate) fn record_physics_time(&mut self, seconds: f32) {
        self.physics_seconds = seconds;
        self.history.push(seconds);
    }

    /// Mean physics time over the recent frames that ran steps.
    pub fn average_physics_seconds(&self) -> f32 {
        self.history.average()
    }

    /// Worst physics time over the recent frames that ran steps.
    pub fn peak_physics_seconds(&self) -> f32 {
        self.history.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_history_tracks_recent_frames() {
        let mut stats = PhysicsFrameStats::default();
        assert_eq!(stats.average_physics_seconds(), 0.0);

        stats.record_physics_time(0.002);
        stats.record_physics_time(0.004);
        assert_relative_eq!(stats.physics_seconds, 0.004);
        assert_relative_eq!(stats.average_physics_seconds(), 0.003);
        assert_relative_eq!(stats.peak_physics_seconds(), 0.004);
    }
}
