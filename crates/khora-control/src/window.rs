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

//! Fixed-size rolling windows of samples.

/// A fixed-size circular buffer of samples.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    data: [T; N],
    index: usize,
    count: usize,
}

impl<T: Default + Copy, const N: usize> RingBuffer<T, N> {
    /// Creates a new, empty ring buffer.
    pub fn new() -> Self {
        Self {
            data: [T::default(); N],
            index: 0,
            count: 0,
        }
    }

    /// Creates a full buffer where every slot holds `value`.
    pub fn filled(value: T) -> Self {
        Self {
            data: [value; N],
            index: 0,
            count: N,
        }
    }

    /// Pushes a new value into the buffer, overwriting the oldest if full.
    pub fn push(&mut self, value: T) {
        self.data[self.index] = value;
        self.index = (self.index + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Overwrites the slot selected by `cursor` (taken modulo `N`).
    ///
    /// Used by callers that own the write position, so that several buffers
    /// fed from the same frame stay aligned.
    pub fn write_at(&mut self, cursor: usize, value: T) {
        let slot = cursor % N;
        self.data[slot] = value;
        self.count = self.count.max(slot + 1);
    }

    /// Sets every slot to `value` and marks the buffer full.
    pub fn fill(&mut self, value: T) {
        *self = Self::filled(value);
    }

    /// Returns the number of elements currently in the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns an iterator over the stored values.
    ///
    /// Values added with [`push`](Self::push) come out oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (oldest, newest) = if self.count < N {
            // Not full: the live values are the first `count` slots.
            (&self.data[..self.count], &self.data[..0])
        } else {
            // Full: the oldest value sits at the write index.
            let (left, right) = self.data.split_at(self.index);
            (right, left)
        };
        oldest.iter().chain(newest.iter())
    }
}

impl<T: Default + Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<f32, N> {
    /// Calculates the arithmetic mean of the values in the buffer.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f32>() / self.count as f32
    }

    /// Returns the maximum value in the buffer, or `0.0` if empty.
    pub fn max(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().copied().fold(f32::MIN, f32::max)
    }
}
