//! SensorHub simulation daemon
//!
//! Wires the core hub to three deterministic producers and runs until the
//! requested duration elapses (or Enter is pressed when no duration was
//! given). The trace file is the verification surface; stdout only carries
//! operator status.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use sensorhub_core::{FileSink, Hub, HubResult, SensorType};

mod producers;

use producers::{ProducerSet, ProducerSpec};

#[derive(Parser, Debug)]
#[command(name = "sensorhub", about = "IoT telemetry hub simulation", version)]
struct Cli {
    /// Trace file path (created or truncated at startup)
    #[arg(long, default_value = "hub.log")]
    log_file: PathBuf,

    /// Run for this many seconds, then stop (0 = run until Enter)
    #[arg(long, default_value_t = 0)]
    duration: u64,

    /// Temperature sampling interval in milliseconds
    #[arg(long, default_value_t = 500)]
    temp_interval_ms: u64,

    /// Humidity sampling interval in milliseconds
    #[arg(long, default_value_t = 700)]
    hum_interval_ms: u64,

    /// Pressure sampling interval in milliseconds
    #[arg(long, default_value_t = 1200)]
    press_interval_ms: u64,
}

fn main() -> HubResult<()> {
    let cli = Cli::parse();

    // Sink unavailable is fatal: refuse to run without the trace
    let sink = Arc::new(FileSink::create(&cli.log_file)?);
    let mut hub = Hub::new(sink);
    hub.start()?;

    let producers = ProducerSet::spawn(
        hub.handle(),
        &[
            ProducerSpec::new(SensorType::Temperature, cli.temp_interval_ms),
            ProducerSpec::new(SensorType::Humidity, cli.hum_interval_ms),
            ProducerSpec::new(SensorType::Pressure, cli.press_interval_ms),
        ],
    );

    if cli.duration > 0 {
        println!(
            "Sensor hub running for {}s, tracing to {}",
            cli.duration,
            cli.log_file.display()
        );
        std::thread::sleep(Duration::from_secs(cli.duration));
    } else {
        println!(
            "Sensor hub running, tracing to {}. Press Enter to stop.",
            cli.log_file.display()
        );
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }

    println!("Shutting down...");
    producers.stop();
    hub.stop()?;

    let stats = hub.queue().stats();
    println!(
        "Processed {} samples ({} dropped, max queue depth {})",
        hub.samples_processed(),
        stats.dropped.load(std::sync::atomic::Ordering::Relaxed),
        stats.max_depth.load(std::sync::atomic::Ordering::Relaxed),
    );

    Ok(())
}
