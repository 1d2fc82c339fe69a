//! Fixed-Size Sliding Window for Moving Averages
//!
//! ## Overview
//!
//! This module provides the per-sensor sliding window the processor uses to
//! maintain a moving average. The window is a fixed-size circular buffer of
//! the `N` most recent values plus a running sum, giving O(1)
//! insert-and-evict with zero allocation after construction.
//!
//! ## Design Rationale
//!
//! Alerting on raw readings is noisy: one electrical spike should not page
//! anyone. Averaging the last `N` readings smooths transients while staying
//! responsive, and keeping a running sum avoids re-summing the window on
//! every update:
//!
//! ```text
//! SlidingWindow<5> after 7 updates of 1..=7:
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  6  │  7  │  3  │  4  │  5  │   sum = 25, len = 5
//! └─────┴─────┴─────┴─────┴─────┘
//!               ↑
//!             cursor (next overwrite)
//! ```
//!
//! ## Warm-Up
//!
//! Until `N` values have been seen the window is "cold": the average is
//! still computed (useful for logging), but it covers fewer than `N`
//! readings and must not be used for alerting. [`WindowUpdate::warm`]
//! reports when the window has filled; callers gate alert evaluation on it.
//!
//! ## Internal Invariants
//!
//! - `cursor < N` and `len <= N`
//! - `sum` equals the arithmetic sum of the values currently held
//! - `warm` iff at least `N` updates have occurred since creation
//!
//! ## Thread Safety
//!
//! Not thread-safe by design: each window is exclusively owned and mutated
//! by the single consumer thread, so no synchronization is needed.

/// Result of inserting one value into a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowUpdate {
    /// Average over the values currently held (cold windows included)
    pub average: f64,
    /// Whether the window holds a full `N` values
    pub warm: bool,
}

/// Fixed-size circular window with a running sum
///
/// ## Type Parameter
///
/// - `N`: window size, a compile-time constant. The processor uses
///   [`crate::processor::WINDOW_SIZE`]; tests pick small sizes directly.
#[derive(Debug, Clone)]
pub struct SlidingWindow<const N: usize> {
    /// Value storage; slots beyond `len` are not yet meaningful
    values: [f64; N],

    /// Running sum of the `len` values currently held
    sum: f64,

    /// Number of populated slots, saturating at N
    len: usize,

    /// Index where the next write occurs, wraps modulo N
    cursor: usize,
}

impl<const N: usize> SlidingWindow<N> {
    /// Create an empty window
    pub const fn new() -> Self {
        Self {
            values: [0.0; N],
            sum: 0.0,
            len: 0,
            cursor: 0,
        }
    }

    /// Insert a value, evicting the oldest once the window is full
    ///
    /// Returns the post-insert average and whether the window is warm.
    /// While filling, the value is only added; once full, the value being
    /// overwritten is subtracted from the running sum first.
    pub fn update(&mut self, value: f64) -> WindowUpdate {
        if self.len < N {
            self.values[self.cursor] = value;
            self.sum += value;
            self.len += 1;
        } else {
            self.sum -= self.values[self.cursor];
            self.values[self.cursor] = value;
            self.sum += value;
        }
        self.cursor = (self.cursor + 1) % N;

        WindowUpdate {
            average: self.sum / self.len.max(1) as f64,
            warm: self.len == N,
        }
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no values have been seen yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if the window has received at least `N` updates
    pub fn is_warm(&self) -> bool {
        self.len == N
    }

    /// Current average without inserting
    ///
    /// Zero for an empty window.
    pub fn average(&self) -> f64 {
        self.sum / self.len.max(1) as f64
    }
}

impl<const N: usize> Default for SlidingWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}
