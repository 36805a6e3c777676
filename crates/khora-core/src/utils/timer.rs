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

//! A monotonic stopwatch used to time frames, batches and jobs.

use std::time::{Duration, Instant};

/// Measures wall-clock time from a start instant.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start_time: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch started now.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Creates a stopwatch that started at `start_time`, e.g. a frame timestamp
    /// captured by the caller before handing control to the scheduler.
    #[inline]
    pub fn started_at(start_time: Instant) -> Self {
        Self { start_time }
    }

    /// Returns the instant this stopwatch started at.
    #[inline]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Returns the elapsed time since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the elapsed time in seconds as `f32`.
    #[inline]
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Returns the elapsed time and restarts the stopwatch.
    #[inline]
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let lap = now.saturating_duration_since(self.start_time);
        self.start_time = now;
        lap
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SLEEP_DURATION_MS: u64 = 20;

    #[test]
    fn stopwatch_elapsed_time_after_delay() {
        let watch = Stopwatch::new();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        assert!(watch.elapsed() >= Duration::from_millis(SLEEP_DURATION_MS));
        assert!(watch.elapsed_secs() >= SLEEP_DURATION_MS as f32 / 1000.0);
    }

    #[test]
    fn stopwatch_started_in_the_past() {
        let earlier = Instant::now();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let watch = Stopwatch::started_at(earlier);
        assert_eq!(watch.start_time(), earlier);
        assert!(watch.elapsed() >= Duration::from_millis(SLEEP_DURATION_MS));
    }

    #[test]
    fn stopwatch_lap_restarts() {
        let mut watch = Stopwatch::new();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let lap = watch.lap();
        assert!(lap >= Duration::from_millis(SLEEP_DURATION_MS));
        assert!(watch.elapsed() < lap);
    }
}
