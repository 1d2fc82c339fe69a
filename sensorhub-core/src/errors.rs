//! Error Types for Hub Initialization and Lifecycle
//!
//! ## Design Philosophy
//!
//! In steady state the pipeline never fails observably: a full queue drops
//! the sample (backpressure by design), an unknown sensor tag is skipped,
//! and a sink write failure is logged and swallowed. What remains are the
//! initialization and lifecycle edges:
//!
//! - **Sink unavailable**: the trace file is the system's only
//!   observability channel, so failing to open it refuses startup rather
//!   than running blind.
//! - **Lifecycle misuse**: starting an already-running hub, or a processor
//!   thread that died with a panic.
//!
//! Errors carry their cause where one exists (`std::io::Error` for the
//! sink) and stay small otherwise.

use thiserror_no_std::Error;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors from the trace sink
#[derive(Error, Debug)]
pub enum SinkError {
    /// Destination could not be opened or written
    #[error("sink I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Formatted record exceeded the fixed line buffer
    #[error("trace record too long for line buffer")]
    RecordTooLong,
}

/// Errors surfaced by the hub lifecycle
#[derive(Error, Debug)]
pub enum HubError {
    /// Trace sink failed - fatal at initialization
    #[error("trace sink unavailable: {0}")]
    Sink(#[from] SinkError),

    /// `start()` called while the processor loop is already running
    #[error("processor already running")]
    AlreadyRunning,

    /// Processor thread terminated with a panic instead of the stop sentinel
    #[error("processor thread panicked")]
    ProcessorPanicked,
}
