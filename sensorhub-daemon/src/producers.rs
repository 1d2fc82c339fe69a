//! Deterministic sensor producers
//!
//! One thread per sensor kind, each emitting a repeating counter-driven
//! value cycle at its own interval. The cycles are fixed so external
//! tooling can verify the trace against known sequences:
//!
//! - temperature: 22 °C..36 °C, period 15
//! - humidity: 40 %..95 %, period 56
//! - pressure: 995 hPa..1020 hPa, period 26
//!
//! Producers only hold a [`SubmitHandle`]; they cannot touch the hub
//! lifecycle, and `submit` never blocks them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use sensorhub_core::{SensorType, SubmitHandle, SystemClock, TimeSource};

/// Next value in a sensor kind's deterministic cycle
pub fn pattern_value(sensor_type: SensorType, tick: u64) -> f64 {
    match sensor_type {
        SensorType::Temperature => 22.0 + (tick % 15) as f64,
        SensorType::Humidity => 40.0 + (tick % 56) as f64,
        SensorType::Pressure => 995.0 + (tick % 26) as f64,
        SensorType::Custom(_) => 0.0,
    }
}

/// One producer thread's configuration
#[derive(Debug, Clone, Copy)]
pub struct ProducerSpec {
    /// Sensor kind to emit
    pub sensor_type: SensorType,
    /// Delay between submissions
    pub interval: Duration,
}

impl ProducerSpec {
    /// Create a spec from a millisecond interval
    pub fn new(sensor_type: SensorType, interval_ms: u64) -> Self {
        Self {
            sensor_type,
            interval: Duration::from_millis(interval_ms),
        }
    }
}

/// Running set of producer threads with a shared stop flag
pub struct ProducerSet {
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ProducerSet {
    /// Spawn one thread per spec, all submitting through `handle`
    pub fn spawn(handle: SubmitHandle, specs: &[ProducerSpec]) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let workers = specs
            .iter()
            .map(|spec| {
                let spec = *spec;
                let handle = handle.clone();
                let stop = Arc::clone(&stop);

                std::thread::spawn(move || {
                    let clock = SystemClock;
                    let mut tick = 0u64;

                    while !stop.load(Ordering::Acquire) {
                        let value = pattern_value(spec.sensor_type, tick);
                        handle.submit(spec.sensor_type, value, clock.now());
                        tick += 1;

                        std::thread::sleep(spec.interval);
                    }

                    log::debug!(
                        "{} producer stopped after {} readings",
                        spec.sensor_type.label(),
                        tick
                    );
                })
            })
            .collect();

        Self { stop, workers }
    }

    /// Raise the stop flag and join every producer
    ///
    /// Each thread exits after at most one more interval sleep.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Release);
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sensorhub_core::{Hub, MemorySink};

    #[test]
    fn patterns_match_reference_cycles() {
        assert_eq!(pattern_value(SensorType::Temperature, 0), 22.0);
        assert_eq!(pattern_value(SensorType::Temperature, 14), 36.0);
        assert_eq!(pattern_value(SensorType::Temperature, 15), 22.0);

        assert_eq!(pattern_value(SensorType::Humidity, 55), 95.0);
        assert_eq!(pattern_value(SensorType::Humidity, 56), 40.0);

        assert_eq!(pattern_value(SensorType::Pressure, 25), 1020.0);
        assert_eq!(pattern_value(SensorType::Pressure, 26), 995.0);
    }

    #[test]
    fn producers_submit_and_stop_cleanly() {
        let sink = Arc::new(MemorySink::new());
        let mut hub = Hub::new(Arc::clone(&sink) as _);
        hub.start().unwrap();

        let producers = ProducerSet::spawn(
            hub.handle(),
            &[ProducerSpec::new(SensorType::Temperature, 5)],
        );

        std::thread::sleep(Duration::from_millis(60));
        producers.stop();
        hub.stop().unwrap();

        let samples = sink.samples();
        assert!(!samples.is_empty());
        // First reading of the temperature cycle
        assert_eq!(&samples[0][..18], "SAMPLE|TEMP|22.000");
    }
}
