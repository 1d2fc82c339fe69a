//! Sample Model for the Telemetry Pipeline
//!
//! ## Overview
//!
//! A [`Sample`] is one timestamped sensor reading: which sensor kind it came
//! from, the measured value, and when it was taken. Samples are immutable
//! value objects - created once by a producer at submission time, moved
//! through the queue, and consumed exactly once by the processor.
//!
//! ## Memory Model
//!
//! Samples are `Copy` and small (24 bytes), so they live in the queue's
//! fixed ring storage without any heap allocation:
//!
//! ```text
//! Sample layout:
//! ├── value: 8 bytes (f64)
//! ├── timestamp: 8 bytes (i64 milliseconds)
//! ├── sensor_type: 2 bytes (discriminant + payload)
//! └── padding: 6 bytes
//! Total: 24 bytes
//! ```
//!
//! ## Unknown Sensor Kinds
//!
//! Producers are not trusted to only emit the three known kinds. A tag that
//! does not parse maps to [`SensorType::Custom`], which carries no window or
//! threshold: the processor skips such samples defensively rather than
//! treating them as an error.

use core::fmt;

use crate::time::Timestamp;

/// Number of sensor kinds the processor keeps a window for
pub const SENSOR_KINDS: usize = 3;

/// Sensor type enumeration
///
/// Maps each known kind to a per-type sliding window and alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SensorType {
    Temperature = 0,
    Humidity = 1,
    Pressure = 2,
    /// Unrecognized producer tag - carried through the trace, never alerted on
    Custom(u8),
}

impl SensorType {
    /// Get the wire tag used in trace records
    pub const fn label(&self) -> &'static str {
        match self {
            SensorType::Temperature => "TEMP",
            SensorType::Humidity => "HUM",
            SensorType::Pressure => "PRESS",
            SensorType::Custom(_) => "UNKNOWN",
        }
    }

    /// Get expected unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Humidity => "%",
            SensorType::Pressure => "hPa",
            SensorType::Custom(_) => "",
        }
    }

    /// Parse a wire tag back into a sensor type
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "TEMP" => Some(SensorType::Temperature),
            "HUM" => Some(SensorType::Humidity),
            "PRESS" => Some(SensorType::Pressure),
            _ => None,
        }
    }

    /// Dense index for per-type processor state
    ///
    /// `None` for [`SensorType::Custom`] - there is no window to update.
    pub const fn slot(&self) -> Option<usize> {
        match self {
            SensorType::Temperature => Some(0),
            SensorType::Humidity => Some(1),
            SensorType::Pressure => Some(2),
            SensorType::Custom(_) => None,
        }
    }

    /// All known sensor kinds, in slot order
    pub const fn known() -> [SensorType; SENSOR_KINDS] {
        [
            SensorType::Temperature,
            SensorType::Humidity,
            SensorType::Pressure,
        ]
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timestamped sensor reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Which sensor kind produced the reading
    pub sensor_type: SensorType,
    /// Measured value in the sensor's unit
    pub value: f64,
    /// Timestamp in milliseconds
    pub timestamp: Timestamp,
}

impl Sample {
    /// Create a new sample
    pub const fn new(sensor_type: SensorType, value: f64, timestamp: Timestamp) -> Self {
        Self {
            sensor_type,
            value,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_size() {
        // Samples live in the queue's ring storage; keep them small
        assert!(core::mem::size_of::<Sample>() <= 24);
    }

    #[test]
    fn labels_round_trip() {
        for kind in SensorType::known() {
            assert_eq!(SensorType::from_label(kind.label()), Some(kind));
        }

        assert_eq!(SensorType::from_label("VOLT"), None);
        assert_eq!(SensorType::Custom(7).label(), "UNKNOWN");
    }

    #[test]
    fn slots_are_dense() {
        for (i, kind) in SensorType::known().iter().enumerate() {
            assert_eq!(kind.slot(), Some(i));
        }
        assert_eq!(SensorType::Custom(0).slot(), None);
    }
}
