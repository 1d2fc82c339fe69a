//! Append-Only Trace Sink for Sample and Alert Records
//!
//! ## Overview
//!
//! The hub's only output channel is an append-only line trace used for
//! external, log-based verification. Two record shapes exist:
//!
//! ```text
//! SAMPLE|TEMP|22.000|1693219301123
//! ALERT|TEMP|32.000|1693219305623|THRESHOLD_EXCEEDED
//! ```
//!
//! Values are always rendered with three decimal places so the trace can be
//! diffed and counted by external tooling.
//!
//! ## Concurrency
//!
//! Producers append `SAMPLE` records while the consumer appends `ALERT`
//! records, so a sink is shared across threads. Implementations synchronize
//! their own append so interleaved writes can never tear a line - callers
//! hold no lock.
//!
//! ## Failure Policy
//!
//! A sink that cannot be opened is fatal at initialization: the hub refuses
//! to start rather than run without observability. Write failures after
//! startup are logged and swallowed - steady-state operations never fail
//! observably.

use core::fmt::{self, Write as _};
use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use std::sync::Mutex;

use crate::errors::SinkError;
use crate::sample::SensorType;
use crate::time::Timestamp;

/// Upper bound for one formatted trace line
///
/// The longest record is an `ALERT` for `PRESS` with a 13-digit timestamp,
/// well under this.
pub const MAX_RECORD_LEN: usize = 96;

/// One line of the trace
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceRecord {
    /// Raw reading as submitted by a producer
    Sample {
        /// Sensor kind tag
        sensor_type: SensorType,
        /// Submitted value
        value: f64,
        /// Submission timestamp in milliseconds
        timestamp: Timestamp,
    },
    /// Threshold alert decided by the processor
    Alert {
        /// Sensor kind tag
        sensor_type: SensorType,
        /// Warm-window moving average that exceeded the threshold
        average: f64,
        /// Timestamp of the sample that tipped the average
        timestamp: Timestamp,
    },
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceRecord::Sample {
                sensor_type,
                value,
                timestamp,
            } => write!(f, "SAMPLE|{}|{:.3}|{}", sensor_type.label(), value, timestamp),
            TraceRecord::Alert {
                sensor_type,
                average,
                timestamp,
            } => write!(
                f,
                "ALERT|{}|{:.3}|{}|THRESHOLD_EXCEEDED",
                sensor_type.label(),
                average,
                timestamp
            ),
        }
    }
}

impl TraceRecord {
    /// Format into a fixed-capacity line buffer
    fn to_line(self) -> Result<heapless::String<MAX_RECORD_LEN>, SinkError> {
        let mut line = heapless::String::new();
        write!(line, "{}", self).map_err(|_| SinkError::RecordTooLong)?;
        Ok(line)
    }
}

/// Append-only destination for trace records
///
/// One record per line. Implementations must synchronize appends
/// internally; the hub shares a single sink between all producers and the
/// processor thread.
pub trait TraceSink: Send + Sync {
    /// Append one record as its own line
    fn append(&self, record: &TraceRecord) -> Result<(), SinkError>;
}

/// File-backed trace sink
///
/// Opens (truncating) at creation and flushes after every record so the
/// trace is complete even if the process dies. All writes go through one
/// mutex - a `SAMPLE` line from a producer can never split an `ALERT` line
/// from the consumer.
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Create the trace file, failing fast if the destination is unusable
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl TraceSink for FileSink {
    fn append(&self, record: &TraceRecord) -> Result<(), SinkError> {
        let line = record.to_line()?;

        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}

/// In-memory trace sink for tests and demos
///
/// Collects formatted lines in order of append.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot all lines appended so far
    pub fn lines(&self) -> Vec<String> {
        self.locked().clone()
    }

    /// Snapshot only `ALERT` lines
    pub fn alerts(&self) -> Vec<String> {
        self.locked()
            .iter()
            .filter(|line| line.starts_with("ALERT|"))
            .cloned()
            .collect()
    }

    /// Snapshot only `SAMPLE` lines
    pub fn samples(&self) -> Vec<String> {
        self.locked()
            .iter()
            .filter(|line| line.starts_with("SAMPLE|"))
            .cloned()
            .collect()
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TraceSink for MemorySink {
    fn append(&self, record: &TraceRecord) -> Result<(), SinkError> {
        let line = record.to_line()?;
        self.locked().push(line.as_str().to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_record_format() {
        let record = TraceRecord::Sample {
            sensor_type: SensorType::Temperature,
            value: 22.0,
            timestamp: 1000,
        };
        assert_eq!(record.to_string(), "SAMPLE|TEMP|22.000|1000");
    }

    #[test]
    fn alert_record_format() {
        let record = TraceRecord::Alert {
            sensor_type: SensorType::Pressure,
            average: 1015.5,
            timestamp: 1693219305623,
        };
        assert_eq!(
            record.to_string(),
            "ALERT|PRESS|1015.500|1693219305623|THRESHOLD_EXCEEDED"
        );
    }

    #[test]
    fn value_rendered_to_three_decimals() {
        let record = TraceRecord::Sample {
            sensor_type: SensorType::Humidity,
            value: 40.123456,
            timestamp: 5,
        };
        assert_eq!(record.to_string(), "SAMPLE|HUM|40.123|5");
    }

    #[test]
    fn memory_sink_preserves_order_and_filters() {
        let sink = MemorySink::new();

        sink.append(&TraceRecord::Sample {
            sensor_type: SensorType::Temperature,
            value: 1.0,
            timestamp: 1,
        })
        .unwrap();
        sink.append(&TraceRecord::Alert {
            sensor_type: SensorType::Temperature,
            average: 30.0,
            timestamp: 2,
        })
        .unwrap();

        assert_eq!(sink.lines().len(), 2);
        assert_eq!(sink.samples(), vec!["SAMPLE|TEMP|1.000|1"]);
        assert_eq!(
            sink.alerts(),
            vec!["ALERT|TEMP|30.000|2|THRESHOLD_EXCEEDED"]
        );
    }

    #[test]
    fn file_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.log");

        let sink = FileSink::create(&path).unwrap();
        sink.append(&TraceRecord::Sample {
            sensor_type: SensorType::Pressure,
            value: 1001.25,
            timestamp: 42,
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "SAMPLE|PRESS|1001.250|42\n");
    }

    #[test]
    fn file_sink_unwritable_path_fails() {
        let result = FileSink::create("/nonexistent-dir/deeper/hub.log");
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
