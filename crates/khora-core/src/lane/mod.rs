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

//! # Lane Abstraction
//!
//! A **Lane** is a swappable processing strategy owned by an agent. The
//! physics agent composes three of them: movement dispatch, visibility
//! caching and debug drawing. This trait carries their identity and
//! classification; execution methods live on the concrete lanes because
//! each one runs at a different point of the frame.

use std::fmt;

/// Classification of lane types, used for logging and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Physics simulation steps.
    Physics,
    /// Visibility queries between simulated objects.
    Visibility,
    /// Debug visualisation.
    Debug,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Physics => write!(f, "Physics"),
            LaneKind::Visibility => write!(f, "Visibility"),
            LaneKind::Debug => write!(f, "Debug"),
        }
    }
}

/// The base trait of every lane.
pub trait Lane: Send + Sync {
    /// Human-readable name of the strategy, e.g. `"ActorMovement"`.
    fn strategy_name(&self) -> &'static str;

    /// What kind of work the lane performs.
    fn lane_kind(&self) -> LaneKind;
}

/// Formats a set of lanes as `Kind:Name` pairs for logging.
pub fn describe_lanes(lanes: &[&dyn Lane]) -> String {
    lanes
        .iter()
        .map(|lane| format!("{}:{}", lane.lane_kind(), lane.strategy_name()))
        .collect::<Vec<_>>()
        .join(", ")
}
