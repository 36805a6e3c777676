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

//! The job system used to fan out per-object work.
//!
//! A thin layer over a dedicated `rayon` pool. Work submitted through
//! [`JobSystem::for_each_mut`] returns only once every job has finished,
//! which makes each call a barrier. A job system with zero workers runs
//! everything inline on the caller.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

/// Errors that can occur when starting the job system.
#[derive(Debug, Error)]
pub enum JobSystemError {
    /// The worker pool could not be spawned.
    #[error("failed to build the job system's thread pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// Runs batches of jobs on a fixed set of workers.
pub struct JobSystem {
    pool: Option<ThreadPool>,
}

impl JobSystem {
    /// Starts a job system with `worker_threads` workers.
    /// `0` builds an inline job system.
    pub fn new(worker_threads: usize) -> Result<Self, JobSystemError> {
        if worker_threads == 0 {
            return Ok(Self::inline());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|index| format!("khora-physics-{index}"))
            .build()?;
        log::debug!("JobSystem: started {worker_threads} worker(s)");
        Ok(Self { pool: Some(pool) })
    }

    /// A job system that runs every job on the calling thread.
    pub fn inline() -> Self {
        Self { pool: None }
    }

    /// Number of threads jobs may run on concurrently.
    pub fn concurrency(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    /// Runs `job` once for every item and waits for all of them.
    ///
    /// Items are grouped so that each job covers at least `min_batch` items.
    /// Jobs run in no particular order.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], min_batch: usize, job: F)
    where
        T: Send,
        F: Fn(&mut T) + Send + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                items
                    .par_iter_mut()
                    .with_min_len(min_batch.max(1))
                    .for_each(job)
            }),
            None => items.iter_mut().for_each(job),
        }
    }

    /// Runs `job` once on every worker, passing the worker index, and waits.
    pub fn broadcast<F>(&self, job: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        match &self.pool {
            Some(pool) => {
                pool.broadcast(|ctx| job(ctx.index()));
            }
            None => job(0),
        }
    }
}

impl std::fmt::Debug for JobSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSystem")
            .field("concurrency", &self.concurrency())
            .field("inline", &self.pool.is_none())
            .finish()
    }
}
