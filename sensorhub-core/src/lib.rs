//! Ingestion and analytics core for SensorHub
//!
//! Simulates an IoT-style telemetry hub: independent sensor producers emit
//! timestamped readings into a bounded queue, and a single processor thread
//! maintains a sliding moving average per sensor kind and raises threshold
//! alerts. Output is a deterministic append-only trace suitable for
//! log-based verification.
//!
//! Key properties:
//! - Producers never block: a full queue drops the sample (load shedding)
//! - One consumer, woken by condvar - no busy-spinning, prompt shutdown
//! - Alerts gate on a warm window and a strict `>` threshold
//!
//! ```no_run
//! use std::sync::Arc;
//! use sensorhub_core::{FileSink, Hub, SensorType};
//!
//! let sink = Arc::new(FileSink::create("hub.log")?);
//! let mut hub = Hub::new(sink);
//!
//! hub.start()?;
//! hub.submit(SensorType::Temperature, 22.5, 1000);
//! hub.stop()?;
//! # Ok::<(), sensorhub_core::HubError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod processor;
pub mod queue;
pub mod sample;
pub mod sink;
pub mod time;
pub mod window;

// Public API
pub use errors::{HubError, HubResult, SinkError};
pub use processor::{Alert, AlertPolicy, Hub, HubConfig, ProcessorState, SubmitHandle, WINDOW_SIZE};
pub use queue::{SampleQueue, DEFAULT_QUEUE_CAPACITY};
pub use sample::{Sample, SensorType};
pub use sink::{FileSink, MemorySink, TraceRecord, TraceSink};
pub use time::{SystemClock, TimeSource, Timestamp};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
