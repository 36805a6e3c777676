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

//! Step planning: how many fixed steps a frame runs, and how long each is.
//!
//! When the measured cost of a step approaches its duration, running every
//! owed step would make the next frame owe even more. The planner caps the
//! step count by the affordable number of steps and stretches the step
//! delta instead, trading accuracy for keeping up.

use khora_core::math::EPSILON;

/// Hard cap on steps per frame, whatever the budget says.
pub const MAX_STEPS_PER_FRAME: u32 = 10;

/// Smallest relative cost used when deriving the affordable step count.
pub const MIN_STEP_COST: f32 = EPSILON;

/// Fraction of a step forgiven when counting the whole steps owed, so that
/// rounding in the accumulator does not drop a step.
pub const STEP_TOLERANCE: f32 = 1e-4;

/// Above this relative cost only one step is affordable.
const SINGLE_STEP_COST: f32 = 0.95;
/// Below this relative cost `ceil(1 / cost)` steps are affordable.
const CHEAP_STEP_COST: f32 = 0.5;

/// Decision for one frame: run `steps` steps of `step_delta` seconds each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    /// Number of steps to run.
    pub steps: u32,
    /// Simulated seconds per step.
    pub step_delta: f32,
}

impl StepPlan {
    /// Simulated time the plan consumes.
    pub fn simulated_time(&self) -> f32 {
        self.steps as f32 * self.step_delta
    }

    /// Whether the step delta was stretched beyond the default.
    pub fn is_degraded(&self, default_dt: f32) -> bool {
        self.step_delta > default_dt
    }
}

/// Number of steps a frame can afford when a step costs `cost` step durations.
pub fn max_allowed_steps(cost: f32) -> u32 {
    let cost = cost.max(MIN_STEP_COST);
    let allowed = if cost > SINGLE_STEP_COST {
        1
    } else if cost < CHEAP_STEP_COST {
        (1.0 / cost).ceil() as u32
    } else {
        2
    };
    allowed.clamp(1, MAX_STEPS_PER_FRAME)
}

/// Plans the steps of a frame.
///
/// * `accumulated` - simulated time owed, in seconds.
/// * `default_dt` - the default step duration.
/// * `total_budget` / `async_budget` - estimated seconds per step of the
///   whole frame and of the off-thread part.
///
/// A frame owing less than one step plans zero steps.
pub fn plan_steps(
    accumulated: f32,
    default_dt: f32,
    total_budget: f32,
    async_budget: f32,
) -> StepPlan {
    let raw_steps = if accumulated > 0.0 {
        (accumulated / default_dt + STEP_TOLERANCE).floor() as u32
    } else {
        0
    };

    let cost = total_budget.max(async_budget) / default_dt;
    let max_allowed = max_allowed_steps(cost);

    if raw_steps <= max_allowed {
        StepPlan {
            steps: raw_steps,
            step_delta: default_dt,
        }
    } else {
        StepPlan {
            steps: max_allowed,
            step_delta: default_dt.max(accumulated / (max_allowed + 1) as f32),
        }
    }
}
