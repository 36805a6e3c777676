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

use khora_core::sync::LockingPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating [`PhysicsSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The RON document could not be parsed.
    #[error("invalid physics settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The step duration must be a positive, finite number of seconds.
    #[error("step duration must be positive and finite, got {0}")]
    InvalidStepDuration(f32),
    /// Movement jobs must cover at least one simulation.
    #[error("job batch size must be at least 1")]
    ZeroBatchSize,
    /// The requested locking policy cannot protect that many workers.
    #[error("locking policy {policy} cannot run with {workers} worker threads")]
    UnsupportedPolicy {
        /// The requested policy.
        policy: LockingPolicy,
        /// The configured worker count.
        workers: usize,
    },
}

/// Configuration of the [`PhysicsAgent`](super::PhysicsAgent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Default duration of a physics step, in seconds.
    pub step_duration: f32,
    /// Refresh passes an unqueried line-of-sight pair survives.
    pub los_cache_expiry: u32,
    /// Job system concurrency; `0` runs every job on the calling thread.
    pub worker_threads: usize,
    /// Whether the physics engine serves concurrent shared reads.
    pub shared_reads: bool,
    /// Overrides the policy derived from `worker_threads` and `shared_reads`.
    pub locking_policy: Option<LockingPolicy>,
    /// Minimum number of simulations per movement job.
    pub job_batch_size: usize,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            step_duration: 1.0 / 60.0,
            los_cache_expiry: 10,
            worker_threads: 1,
            shared_reads: true,
            locking_policy: None,
            job_batch_size: 1,
        }
    }
}

impl PhysicsSettings {
    /// Parses settings from a RON document. Missing fields keep their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The locking policy the agent runs with.
    pub fn resolved_policy(&self) -> LockingPolicy {
        self.locking_policy
            .unwrap_or_else(|| LockingPolicy::detect(self.worker_threads, self.shared_reads))
    }

    /// Checks the settings for values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.step_duration.is_finite() && self.step_duration > 0.0) {
            return Err(SettingsError::InvalidStepDuration(self.step_duration));
        }
        if self.job_batch_size == 0 {
            return Err(SettingsError::ZeroBatchSize);
        }
        let policy = self.resolved_policy();
        if !policy.supports(self.worker_threads) {
            return Err(SettingsError::UnsupportedPolicy {
                policy,
                workers: self.worker_threads,
            });
        }
        Ok(())
    }
}
