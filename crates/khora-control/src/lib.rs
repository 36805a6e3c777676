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

//! # Khora Control
//!
//! Adaptive control of the physics frame. The [`budget::BudgetEstimator`]
//! turns recent timing measurements into a seconds-per-step estimate and
//! [`planner::plan_steps`] uses it to decide how many fixed steps a frame
//! can afford without falling further behind.

#![warn(missing_docs)]

pub mod budget;
pub mod planner;
pub mod window;

pub use budget::{BudgetEstimator, BudgetSample, BUDGET_WINDOW};
pub use planner::{plan_steps, StepPlan, MAX_STEPS_PER_FRAME};
pub use window::RingBuffer;
