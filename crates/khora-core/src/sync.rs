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

//! Policy-driven locks.
//!
//! The locking discipline of the physics scheduler is chosen once, at
//! startup, from the job system's concurrency and the engine's capabilities.
//! Code acquiring a [`PolicyLock`] always asks for the access it needs
//! (shared or exclusive); the policy decides what that actually costs.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// How shared and exclusive acquisitions are honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockingPolicy {
    /// A single thread touches the data at a time, so locking never waits.
    ///
    /// The underlying lock is still taken with a non-blocking try: the
    /// acquisition costs an uncontended atomic and doubles as an assertion.
    /// An acquisition that would block is a configuration fault and panics.
    NoLocks,
    /// Every acquisition is exclusive, for engines that cannot serve
    /// concurrent shared reads.
    ExclusiveLocksOnly,
    /// Shared acquisitions are concurrent, exclusive ones wait for readers.
    AllowSharedLocks,
}

impl LockingPolicy {
    /// Picks the policy matching a job system with `worker_threads` workers.
    ///
    /// At most one worker means movement jobs never overlap with each other
    /// or with the orchestrator.
    pub fn detect(worker_threads: usize, shared_reads: bool) -> Self {
        match (worker_threads, shared_reads) {
            (0 | 1, _) => LockingPolicy::NoLocks,
            (_, true) => LockingPolicy::AllowSharedLocks,
            (_, false) => LockingPolicy::ExclusiveLocksOnly,
        }
    }

    /// Whether this policy is safe with `worker_threads` concurrent workers.
    pub fn supports(&self, worker_threads: usize) -> bool {
        !matches!(self, LockingPolicy::NoLocks) || worker_threads <= 1
    }
}

impl std::fmt::Display for LockingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockingPolicy::NoLocks => write!(f, "NoLocks"),
            LockingPolicy::ExclusiveLocksOnly => write!(f, "ExclusiveLocksOnly"),
            LockingPolicy::AllowSharedLocks => write!(f, "AllowSharedLocks"),
        }
    }
}

/// A read-write lock whose behaviour follows a [`LockingPolicy`].
///
/// Poisoning is ignored: guarded values stay field-wise consistent across a
/// panicking holder, so the guard is recovered instead of propagated.
#[derive(Debug)]
pub struct PolicyLock<T> {
    policy: LockingPolicy,
    inner: RwLock<T>,
}

/// Guard returned by [`PolicyLock::read`].
#[derive(Debug)]
pub enum PolicyReadGuard<'a, T> {
    /// A genuinely shared guard.
    Shared(RwLockReadGuard<'a, T>),
    /// An exclusive guard standing in for a shared one.
    Exclusive(RwLockWriteGuard<'a, T>),
}

impl<T> Deref for PolicyReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            PolicyReadGuard::Shared(guard) => &**guard,
            PolicyReadGuard::Exclusive(guard) => &**guard,
        }
    }
}

impl<T> PolicyLock<T> {
    /// Wraps `value` under `policy`.
    pub fn new(policy: LockingPolicy, value: T) -> Self {
        Self {
            policy,
            inner: RwLock::new(value),
        }
    }

    /// The policy this lock follows.
    pub fn policy(&self) -> LockingPolicy {
        self.policy
    }

    /// Acquires shared access.
    ///
    /// # Panics
    /// Under [`LockingPolicy::NoLocks`], if the lock is held exclusively.
    pub fn read(&self) -> PolicyReadGuard<'_, T> {
        match self.policy {
            LockingPolicy::NoLocks => match self.inner.try_read() {
                Ok(guard) => PolicyReadGuard::Shared(guard),
                Err(TryLockError::Poisoned(poisoned)) => {
                    PolicyReadGuard::Shared(poisoned.into_inner())
                }
                Err(TryLockError::WouldBlock) => {
                    panic!("PolicyLock: contended shared lock under NoLocks policy")
                }
            },
            LockingPolicy::ExclusiveLocksOnly => PolicyReadGuard::Exclusive(
                self.inner.write().unwrap_or_else(|p| p.into_inner()),
            ),
            LockingPolicy::AllowSharedLocks => {
                PolicyReadGuard::Shared(self.inner.read().unwrap_or_else(|p| p.into_inner()))
            }
        }
    }

    /// Acquires exclusive access.
    ///
    /// # Panics
    /// Under [`LockingPolicy::NoLocks`], if the lock is held at all.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        match self.policy {
            LockingPolicy::NoLocks => match self.inner.try_write() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    panic!("PolicyLock: contended exclusive lock under NoLocks policy")
                }
            },
            _ => self.inner.write().unwrap_or_else(|p| p.into_inner()),
        }
    }

    /// Mutable access without locking; the borrow checker proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut().unwrap_or_else(|p| p.into_inner())
    }

    /// Consumes the lock and returns the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

impl<T: Default> Default for PolicyLock<T> {
    fn default() -> Self {
        Self::new(LockingPolicy::NoLocks, T::default())
    }
}
