//! Processor Loop, Alert Policy, and Hub Lifecycle
//!
//! ## Overview
//!
//! This module ties the pipeline together. The [`Hub`] owns the shared
//! [`SampleQueue`] and the trace sink, spawns the single consumer thread,
//! and hands producers a cheap [`SubmitHandle`]. The [`Processor`] is the
//! consumer's private state: one sliding window per known sensor kind plus
//! the threshold policy.
//!
//! ```text
//! Producers → submit() → SampleQueue → Processor loop → window → alert? → Sink
//!                 │                                                        ↑
//!                 └── SAMPLE trace ───────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//!
//! The queue is the only state shared between threads and carries its own
//! lock. Each window is exclusively owned and mutated by the consumer
//! thread, so window updates need no synchronization at all. Nothing here
//! is a process-wide singleton: one hub, one queue, one sink, all injected.
//!
//! ## State Machine
//!
//! The consumer loop walks `Running → Stopping → Stopped`:
//!
//! - `start()` spawns the loop thread in `Running`.
//! - `stop()` moves to `Stopping` and shuts the queue down, so a blocked
//!   `take()` returns the stop sentinel immediately instead of waiting for
//!   more data.
//! - The loop observes the sentinel, exits, and the state becomes
//!   `Stopped` (terminal). `stop()` joins the thread before returning.
//!
//! Samples still enqueued when `stop()` arrives may be dropped; prompt
//! shutdown wins over draining.
//!
//! ## Alert Decision
//!
//! Per sample: resolve the sensor kind to its window (unrecognized kinds
//! are skipped defensively), insert the value, and alert only when the
//! window is warm and the average *strictly* exceeds the kind's threshold.
//! An average exactly at the threshold never alerts. Cold windows never
//! alert no matter how extreme the values - the first `WINDOW_SIZE`
//! readings of a sensor are warm-up, by design.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::errors::{HubError, HubResult};
use crate::queue::{SampleQueue, DEFAULT_QUEUE_CAPACITY};
use crate::sample::{Sample, SensorType, SENSOR_KINDS};
use crate::sink::{TraceRecord, TraceSink};
use crate::time::Timestamp;
use crate::window::SlidingWindow;

/// Number of recent readings averaged per sensor kind
pub const WINDOW_SIZE: usize = 5;

/// Per-kind alert thresholds
///
/// A warm window whose average strictly exceeds its kind's threshold
/// raises an alert. Thresholds are fixed at construction - there is no
/// runtime reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    /// Temperature threshold in °C
    pub temperature: f64,
    /// Humidity threshold in %
    pub humidity: f64,
    /// Pressure threshold in hPa
    pub pressure: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            temperature: 28.0,
            humidity: 80.0,
            pressure: 1015.0,
        }
    }
}

impl AlertPolicy {
    /// Create a policy with custom thresholds
    pub const fn new_with_limits(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature,
            humidity,
            pressure,
        }
    }

    /// Threshold for a sensor kind, `None` for unrecognized kinds
    pub const fn threshold(&self, sensor_type: SensorType) -> Option<f64> {
        match sensor_type {
            SensorType::Temperature => Some(self.temperature),
            SensorType::Humidity => Some(self.humidity),
            SensorType::Pressure => Some(self.pressure),
            SensorType::Custom(_) => None,
        }
    }
}

/// Threshold alert decided by the processor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alert {
    /// Sensor kind whose window tripped
    pub sensor_type: SensorType,
    /// Warm-window moving average at decision time
    pub average: f64,
    /// Timestamp of the sample that tipped the average
    pub timestamp: Timestamp,
}

/// Consumer loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProcessorState {
    /// Terminal (and initial, before `start()`)
    Stopped = 0,
    /// Loop thread is consuming the queue
    Running = 1,
    /// Stop requested, sentinel not yet observed
    Stopping = 2,
}

impl ProcessorState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ProcessorState::Running,
            2 => ProcessorState::Stopping,
            _ => ProcessorState::Stopped,
        }
    }
}

/// Per-sensor analytics state owned by the consumer thread
///
/// Holds one sliding window per known sensor kind and the alert policy.
/// [`Processor::step`] is pure sequential logic, which keeps the alert
/// decision testable without threads.
pub struct Processor {
    windows: [SlidingWindow<WINDOW_SIZE>; SENSOR_KINDS],
    policy: AlertPolicy,
}

impl Processor {
    /// Create a processor with empty windows
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            windows: std::array::from_fn(|_| SlidingWindow::new()),
            policy,
        }
    }

    /// Consume one sample: update its window, decide whether to alert
    ///
    /// Samples with an unrecognized sensor kind are discarded without
    /// touching any window - a defensive skip, not an error.
    pub fn step(&mut self, sample: &Sample) -> Option<Alert> {
        let slot = match sample.sensor_type.slot() {
            Some(slot) => slot,
            None => {
                log::trace!("skipping sample with unrecognized sensor tag");
                return None;
            }
        };

        let update = self.windows[slot].update(sample.value);
        let threshold = self.policy.threshold(sample.sensor_type)?;

        if update.warm && update.average > threshold {
            Some(Alert {
                sensor_type: sample.sensor_type,
                average: update.average,
                timestamp: sample.timestamp,
            })
        } else {
            None
        }
    }

    /// Run the consumer loop until the queue's stop sentinel
    fn run(
        mut self,
        queue: Arc<SampleQueue>,
        sink: Arc<dyn TraceSink>,
        processed: Arc<AtomicU64>,
        state: Arc<AtomicU8>,
    ) {
        log::info!("processor loop started");

        while let Some(sample) = queue.take() {
            if let Some(alert) = self.step(&sample) {
                let record = TraceRecord::Alert {
                    sensor_type: alert.sensor_type,
                    average: alert.average,
                    timestamp: alert.timestamp,
                };
                if let Err(e) = sink.append(&record) {
                    log::warn!("alert trace write failed: {e}");
                }
            }
            processed.fetch_add(1, Ordering::Release);
        }

        state.store(ProcessorState::Stopped as u8, Ordering::Release);
        log::info!("processor loop stopped");
    }
}

/// Cloneable producer capability
///
/// Exposes only `submit`; producers cannot touch the lifecycle. Cheap to
/// clone (two `Arc`s), one per producer thread.
#[derive(Clone)]
pub struct SubmitHandle {
    queue: Arc<SampleQueue>,
    sink: Arc<dyn TraceSink>,
}

impl SubmitHandle {
    /// Submit one reading
    ///
    /// Never blocks and never reports failure to the caller: a full queue
    /// drops the sample silently (the backpressure policy), and only
    /// successfully enqueued samples leave a `SAMPLE` trace line.
    pub fn submit(&self, sensor_type: SensorType, value: f64, timestamp: Timestamp) {
        let sample = Sample::new(sensor_type, value, timestamp);

        if !self.queue.push(sample) {
            log::debug!("queue full, dropped {} sample", sensor_type.label());
            return;
        }

        let record = TraceRecord::Sample {
            sensor_type,
            value,
            timestamp,
        };
        if let Err(e) = self.sink.append(&record) {
            log::warn!("sample trace write failed: {e}");
        }
    }
}

/// Hub configuration
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Queue slot count (usable capacity is one less)
    pub queue_capacity: usize,
    /// Alert thresholds
    pub policy: AlertPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            policy: AlertPolicy::default(),
        }
    }
}

/// The telemetry hub: shared queue, trace sink, and consumer lifecycle
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use sensorhub_core::processor::Hub;
/// use sensorhub_core::sample::SensorType;
/// use sensorhub_core::sink::MemorySink;
///
/// let sink = Arc::new(MemorySink::new());
/// let mut hub = Hub::new(sink);
///
/// hub.start().unwrap();
/// hub.submit(SensorType::Temperature, 22.5, 1000);
/// hub.stop().unwrap();
/// ```
pub struct Hub {
    handle: SubmitHandle,
    config: HubConfig,
    processed: Arc<AtomicU64>,
    state: Arc<AtomicU8>,
    worker: Option<JoinHandle<()>>,
}

impl Hub {
    /// Create a hub with default configuration
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self::with_config(sink, HubConfig::default())
    }

    /// Create a hub with explicit queue capacity and thresholds
    pub fn with_config(sink: Arc<dyn TraceSink>, config: HubConfig) -> Self {
        let queue = Arc::new(SampleQueue::with_capacity(config.queue_capacity));

        Self {
            handle: SubmitHandle { queue, sink },
            config,
            processed: Arc::new(AtomicU64::new(0)),
            state: Arc::new(AtomicU8::new(ProcessorState::Stopped as u8)),
            worker: None,
        }
    }

    /// Spawn the consumer loop
    pub fn start(&mut self) -> HubResult<()> {
        if self.worker.is_some() {
            return Err(HubError::AlreadyRunning);
        }

        self.state
            .store(ProcessorState::Running as u8, Ordering::Release);

        let processor = Processor::new(self.config.policy);
        let queue = Arc::clone(&self.handle.queue);
        let sink = Arc::clone(&self.handle.sink);
        let processed = Arc::clone(&self.processed);
        let state = Arc::clone(&self.state);

        self.worker = Some(std::thread::spawn(move || {
            processor.run(queue, sink, processed, state);
        }));

        Ok(())
    }

    /// Signal shutdown and join the consumer thread
    ///
    /// Idempotent: stopping a hub that never started (or already stopped)
    /// is a no-op. Pending samples are not drained, and the queue stays
    /// shut down - a stopped hub is terminal, build a new one to restart.
    pub fn stop(&mut self) -> HubResult<()> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => return Ok(()),
        };

        self.state
            .store(ProcessorState::Stopping as u8, Ordering::Release);
        self.handle.queue.shutdown();

        worker.join().map_err(|_| HubError::ProcessorPanicked)?;
        Ok(())
    }

    /// Submit one reading (see [`SubmitHandle::submit`])
    pub fn submit(&self, sensor_type: SensorType, value: f64, timestamp: Timestamp) {
        self.handle.submit(sensor_type, value, timestamp);
    }

    /// Get a cloneable producer capability
    pub fn handle(&self) -> SubmitHandle {
        self.handle.clone()
    }

    /// Current consumer loop state
    pub fn state(&self) -> ProcessorState {
        ProcessorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Count of samples fully processed by the consumer
    ///
    /// Incremented after the window update and any alert emission, so
    /// tests can await quiescence instead of sleeping.
    pub fn samples_processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    /// The shared queue, mainly for stats inspection
    pub fn queue(&self) -> &SampleQueue {
        &self.handle.queue
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        // Best effort: never leave a detached consumer blocked forever
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> Processor {
        Processor::new(AlertPolicy::default())
    }

    fn temp(value: f64, timestamp: Timestamp) -> Sample {
        Sample::new(SensorType::Temperature, value, timestamp)
    }

    #[test]
    fn no_alert_while_cold_even_above_threshold() {
        let mut p = processor();

        // Four extreme readings - window still cold, never alert
        for i in 0..WINDOW_SIZE - 1 {
            assert_eq!(p.step(&temp(100.0, i as i64)), None);
        }

        // Fifth reading warms the window; now it may alert
        let alert = p.step(&temp(100.0, 4)).expect("warm window over threshold");
        assert_eq!(alert.average, 100.0);
    }

    #[test]
    fn boundary_average_does_not_alert() {
        let mut p = processor();

        // Average lands exactly on the 28.0 threshold: strict > means no alert
        for v in [26.0, 27.0, 28.0, 29.0, 30.0] {
            assert_eq!(p.step(&temp(v, 0)), None);
        }

        // Evicting the 26.0 lifts the average to 29.0 > 28.0
        let alert = p.step(&temp(31.0, 99)).expect("average now above threshold");
        assert!((alert.average - 29.0).abs() < 1e-9);
        assert_eq!(alert.timestamp, 99);
    }

    #[test]
    fn ramp_below_threshold_never_alerts() {
        let mut p = processor();

        // 22..=28: averages reach 26.4 at most, below the 28.0 threshold
        for (i, v) in (22..=28).enumerate() {
            assert_eq!(p.step(&temp(v as f64, i as i64)), None);
        }
    }

    #[test]
    fn hot_burst_alerts_once_warm() {
        let mut p = processor();

        let mut alerts = Vec::new();
        for (i, v) in (30..=34).enumerate() {
            if let Some(alert) = p.step(&temp(v as f64, i as i64)) {
                alerts.push(alert);
            }
        }

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].average, 32.0);
        assert_eq!(alerts[0].sensor_type, SensorType::Temperature);
    }

    #[test]
    fn kinds_use_independent_windows() {
        let mut p = processor();

        // Warm and trip the humidity window
        for _ in 0..WINDOW_SIZE {
            p.step(&Sample::new(SensorType::Humidity, 90.0, 0));
        }

        // Temperature window is still cold and must not alert
        assert_eq!(p.step(&temp(35.0, 0)), None);
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let mut p = processor();

        for _ in 0..10 {
            let sample = Sample::new(SensorType::Custom(9), 1e9, 0);
            assert_eq!(p.step(&sample), None);
        }
    }

    #[test]
    fn custom_policy_thresholds() {
        let policy = AlertPolicy::new_with_limits(10.0, 20.0, 30.0);
        assert_eq!(policy.threshold(SensorType::Temperature), Some(10.0));
        assert_eq!(policy.threshold(SensorType::Pressure), Some(30.0));
        assert_eq!(policy.threshold(SensorType::Custom(0)), None);

        let mut p = Processor::new(policy);
        for _ in 0..WINDOW_SIZE - 1 {
            assert_eq!(p.step(&temp(11.0, 0)), None);
        }
        assert!(p.step(&temp(11.0, 0)).is_some());
    }
}
