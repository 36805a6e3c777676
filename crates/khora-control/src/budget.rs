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

//! Windowed estimation of the cost of one physics step.

use crate::window::RingBuffer;

/// Number of frames the estimate averages over.
pub const BUDGET_WINDOW: usize = 4;

/// Time spent on a batch of steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BudgetSample {
    /// Wall-clock seconds the batch took.
    pub seconds: f32,
    /// Steps in the batch.
    pub steps: u32,
}

/// Estimates seconds per physics step over the last [`BUDGET_WINDOW`] frames.
///
/// The estimate is the ratio of summed seconds to summed steps, so frames
/// that ran many steps weigh more than frames that ran one. Used from the
/// orchestrator thread only.
#[derive(Debug, Clone)]
pub struct BudgetEstimator {
    window: RingBuffer<BudgetSample, BUDGET_WINDOW>,
}

impl BudgetEstimator {
    /// Creates an estimator whose window is seeded with `seed` seconds per step.
    pub fn new(seed: f32) -> Self {
        Self {
            window: RingBuffer::filled(BudgetSample {
                seconds: seed,
                steps: 1,
            }),
        }
    }

    /// Records that `steps` steps took `elapsed` seconds, in the window slot
    /// selected by `cursor`. Batches without steps carry no information and
    /// are ignored.
    pub fn update(&mut self, elapsed: f32, steps: u32, cursor: usize) {
        if steps == 0 {
            log::trace!("BudgetEstimator: ignoring a sample without steps");
            return;
        }
        self.window.write_at(
            cursor,
            BudgetSample {
                seconds: elapsed.max(0.0),
                steps,
            },
        );
    }

    /// Current estimate of seconds per step.
    pub fn get(&self) -> f32 {
        let (seconds, steps) = self
            .window
            .iter()
            .fold((0.0_f32, 0_u32), |(s, n), sample| {
                (s + sample.seconds, n + sample.steps)
            });
        if steps == 0 {
            0.0
        } else {
            seconds / steps as f32
        }
    }

    /// Forgets every measurement and restarts from `seed` seconds per step.
    pub fn reset(&mut self, seed: f32) {
        self.window.fill(BudgetSample {
            seconds: seed,
            steps: 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_seeded_estimate() {
        let budget = BudgetEstimator::new(0.008);
        assert_relative_eq!(budget.get(), 0.008);
    }

    #[test]
    fn test_update_weighs_by_steps() {
        let mut budget = BudgetEstimator::new(0.01);
        budget.update(0.04, 2, 0);
        // (3 * 0.01 + 0.04) / (3 + 2)
        assert_relative_eq!(budget.get(), 0.014);
    }

    #[test]
    fn test_cursor_wraps_over_window() {
        let mut budget = BudgetEstimator::new(0.0);
        for cursor in 0..BUDGET_WINDOW {
            budget.update(0.01, 1, cursor);
        }
        assert_relative_eq!(budget.get(), 0.01);

        // Cursor BUDGET_WINDOW lands on slot 0 again.
        budget.update(0.05, 1, BUDGET_WINDOW);
        assert_relative_eq!(budget.get(), (0.05 + 3.0 * 0.01) / 4.0);
    }

    #[test]
    fn test_zero_step_batch_is_ignored() {
        let mut budget = BudgetEstimator::new(0.02);
        budget.update(1.0, 0, 0);
        assert_relative_eq!(budget.get(), 0.02);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut budget = BudgetEstimator::new(0.01);
        budget.update(0.5, 3, 1);
        budget.reset(1.0 / 60.0);
        let once = budget.get();
        budget.reset(1.0 / 60.0);
        assert_relative_eq!(budget.get(), once);
        assert_relative_eq!(once, 1.0 / 60.0);
    }
}
