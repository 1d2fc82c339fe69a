//! Bounded Sample Queue Between Producers and the Processor
//!
//! ## Overview
//!
//! This module implements the bounded, FIFO hand-off between sensor
//! producers and the single processor thread. Any number of producers may
//! push concurrently; exactly one consumer blocks in [`SampleQueue::take`]
//! until data arrives or the queue is shut down.
//!
//! ## Backpressure Policy
//!
//! Producers must never stall - a sensor loop that blocks on a slow
//! consumer stops sampling. When the queue is full the new sample is
//! dropped silently instead:
//!
//! ```text
//! Producers (N threads)              Consumer (1 thread)
//!      ↓                                   ↓
//!   push() ────→ Ring Buffer ────→ take() (blocks on empty)
//!      ↓
//!   full? drop, never block
//! ```
//!
//! Drops are not an error and are invisible to the producer; the
//! [`QueueStats`] counters exist purely for diagnostics.
//!
//! ## Algorithm
//!
//! A ring buffer of capacity `C` with head/tail indices modulo `C`. One
//! slot stays reserved to disambiguate full from empty, so the live count
//! is always in `[0, C-1]`:
//!
//! ```text
//! ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//! │  0  │  1  │  2  │  3  │  4  │  5  │  6  │  7  │
//! └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!          ↑                       ↑
//!        head                    tail
//!        (next read)          (next write)
//!
//! empty: head == tail      full: (tail + 1) % C == head
//! ```
//!
//! ## Concurrency Discipline
//!
//! All queue-state transitions (head, tail, slot contents, shutdown flag)
//! happen under one mutex, and the wait-for-data condition variable is
//! keyed to that same mutex. The consumer re-checks the predicate under
//! the lock after every wakeup, so a racing push/shutdown can never cause
//! a missed wakeup. The consumer never busy-spins.
//!
//! Statistics live outside the lock as relaxed atomics - they track queue
//! health without extending the critical section.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};

use crate::sample::Sample;

/// Default queue capacity (samples)
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Queue state guarded by the mutex
struct Inner {
    /// Ring buffer storage; `None` slots are free
    slots: Box<[Option<Sample>]>,
    /// Next read position
    head: usize,
    /// Next write position
    tail: usize,
    /// Set once by `shutdown()`, observed by the blocked consumer
    shutdown: bool,
}

impl Inner {
    fn len(&self, capacity: usize) -> usize {
        (self.tail + capacity - self.head) % capacity
    }
}

/// Queue health counters
///
/// Updated with relaxed ordering - they never affect correctness, only
/// observability.
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Samples accepted into the queue
    pub pushed: AtomicU32,
    /// Samples handed to the consumer
    pub popped: AtomicU32,
    /// Samples dropped because the queue was full
    pub dropped: AtomicU32,
    /// Maximum live count observed
    pub max_depth: AtomicU32,
}

impl QueueStats {
    const fn new() -> Self {
        Self {
            pushed: AtomicU32::new(0),
            popped: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            max_depth: AtomicU32::new(0),
        }
    }

    /// Update max depth if current is higher
    fn update_max_depth(&self, current: u32) {
        let mut max = self.max_depth.load(Ordering::Relaxed);
        while current > max {
            match self.max_depth.compare_exchange_weak(
                max,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }
}

/// Bounded multi-producer, single-consumer sample queue
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use sensorhub_core::queue::SampleQueue;
/// use sensorhub_core::sample::{Sample, SensorType};
///
/// let queue = Arc::new(SampleQueue::with_capacity(64));
///
/// // Producer side - never blocks
/// queue.push(Sample::new(SensorType::Temperature, 22.5, 1000));
///
/// // Consumer side - blocks on empty, `None` is the stop sentinel
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     std::thread::spawn(move || {
///         while let Some(sample) = queue.take() {
///             // process sample
///         }
///     })
/// };
///
/// queue.shutdown();
/// consumer.join().unwrap();
/// ```
pub struct SampleQueue {
    inner: Mutex<Inner>,
    /// Signalled on push and on shutdown
    available: Condvar,
    stats: QueueStats,
    capacity: usize,
}

impl SampleQueue {
    /// Create a queue with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a queue holding up to `capacity - 1` live samples
    ///
    /// One slot is reserved to distinguish full from empty.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 2, "queue needs at least one usable slot");

        Self {
            inner: Mutex::new(Inner {
                slots: vec![None; capacity].into_boxed_slice(),
                head: 0,
                tail: 0,
                shutdown: false,
            }),
            available: Condvar::new(),
            stats: QueueStats::new(),
            capacity,
        }
    }

    /// Append a sample, waking one waiting consumer
    ///
    /// Returns `false` when the sample was dropped (queue full or already
    /// shut down). Drops are the backpressure policy, not an error: the
    /// return value is diagnostic only and producers are free to ignore it.
    /// Never blocks.
    pub fn push(&self, sample: Sample) -> bool {
        let mut inner = self.lock();

        if inner.shutdown {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let next_tail = (inner.tail + 1) % self.capacity;
        if next_tail == inner.head {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let tail = inner.tail;
        inner.slots[tail] = Some(sample);
        inner.tail = next_tail;

        let depth = inner.len(self.capacity) as u32;
        drop(inner);

        self.available.notify_one();
        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.stats.update_max_depth(depth);
        true
    }

    /// Remove the oldest sample, blocking while the queue is empty
    ///
    /// Returns `None` as the stop sentinel once [`SampleQueue::shutdown`]
    /// has been called and no wait is pending. Samples still enqueued at
    /// shutdown are not drained.
    pub fn take(&self) -> Option<Sample> {
        let mut inner = self.lock();

        loop {
            if inner.head != inner.tail {
                let head = inner.head;
                let sample = inner.slots[head]
                    .take()
                    .unwrap_or_else(|| unreachable!("live slot between head and tail was empty"));
                inner.head = (head + 1) % self.capacity;

                self.stats.popped.fetch_add(1, Ordering::Relaxed);
                return Some(sample);
            }

            if inner.shutdown {
                return None;
            }

            inner = match self.available.wait(inner) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Signal shutdown, waking any blocked consumer
    ///
    /// Idempotent. Later pushes are dropped; `take()` returns the stop
    /// sentinel once the remaining wakeup is observed.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.shutdown = true;
        drop(inner);

        self.available.notify_all();
    }

    /// Check whether shutdown has been signalled
    pub fn is_shut_down(&self) -> bool {
        self.lock().shutdown
    }

    /// Number of live samples
    pub fn len(&self) -> usize {
        let inner = self.lock();
        inner.len(self.capacity)
    }

    /// Check if no samples are waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total slot count; usable capacity is one less
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Lock the queue state, recovering from a poisoned mutex
    ///
    /// A producer panicking mid-push leaves the indices consistent (they
    /// are updated last), so continuing past the poison is sound.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for SampleQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SensorType;
    use std::sync::Arc;
    use std::time::Duration;

    fn sample(value: f64) -> Sample {
        Sample::new(SensorType::Temperature, value, value as i64)
    }

    #[test]
    fn fifo_order() {
        let queue = SampleQueue::with_capacity(16);

        for i in 0..10 {
            assert!(queue.push(sample(i as f64)));
        }

        for i in 0..10 {
            assert_eq!(queue.take().unwrap().value, i as f64);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn drop_on_full_leaves_queue_unchanged() {
        let queue = SampleQueue::with_capacity(4);

        // Usable capacity is 3 (one slot reserved)
        for i in 0..3 {
            assert!(queue.push(sample(i as f64)));
        }
        assert_eq!(queue.len(), 3);

        assert!(!queue.push(sample(99.0)));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.stats().dropped.load(Ordering::Relaxed), 1);

        // FIFO content unchanged by the dropped push
        assert_eq!(queue.take().unwrap().value, 0.0);
    }

    #[test]
    fn take_blocks_until_push() {
        let queue = Arc::new(SampleQueue::with_capacity(8));

        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.take())
        };

        // Give the consumer time to park on the condvar
        std::thread::sleep(Duration::from_millis(50));
        assert!(queue.push(sample(7.0)));

        let taken = consumer.join().unwrap();
        assert_eq!(taken.unwrap().value, 7.0);
    }

    #[test]
    fn shutdown_wakes_blocked_consumer() {
        let queue = Arc::new(SampleQueue::with_capacity(8));

        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.take())
        };

        std::thread::sleep(Duration::from_millis(50));
        queue.shutdown();

        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn shutdown_is_idempotent_and_rejects_pushes() {
        let queue = SampleQueue::with_capacity(8);

        queue.shutdown();
        queue.shutdown();

        assert!(!queue.push(sample(1.0)));
        assert_eq!(queue.take(), None);
        assert_eq!(queue.take(), None);
    }

    #[test]
    fn concurrent_producers_lose_nothing_under_capacity() {
        let queue = Arc::new(SampleQueue::with_capacity(256));

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        assert!(queue.push(sample((p * 100 + i) as f64)));
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }

        let mut count = 0;
        queue.shutdown();
        while queue.take().is_some() {
            count += 1;
        }
        assert_eq!(count, 200);
        assert_eq!(queue.stats().pushed.load(Ordering::Relaxed), 200);
    }
}
