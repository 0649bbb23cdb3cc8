//! Error types for the measurement pipeline.
//!
//! Framing problems (bad checksums, misaligned sentinels, stale chunk pairs) and
//! unrecognized measurement modes are expected under normal radio noise and are
//! never reported through this type. They are resolved inside the pipeline by
//! resynchronization or by silently dropping the affected bytes.
//!
//! ## Error Categories
//!
//! - **Transport Errors**: The notification source failed or was closed
//! - **File Errors**: Problems reading configuration or capture files
//! - **Parse Errors**: Malformed configuration, capture logs or UUID templates
//! - **Bounds Errors**: A layout field reaches past the end of a frame
//! - **Sink Failures**: An observer reported an unrecoverable failure
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use meterlink::MeterError;
//!
//! let error = MeterError::transport_failed("link dropped");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T, E = MeterError> = std::result::Result<T, E>;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MeterError {
    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Read of {width} bytes at offset {offset} exceeds frame length {len}")]
    OutOfBounds { offset: usize, width: usize, len: usize },

    #[error("Sink '{sink}' failed during {stage} dispatch: {reason}")]
    SinkFailure { stage: &'static str, sink: String, reason: String },
}

impl MeterError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Only transport errors qualify. Hosts are expected to attempt at most
    /// [`crate::MAX_RECONNECT_ATTEMPTS`] reconnects before giving up.
    pub fn is_retryable(&self) -> bool {
        match self {
            MeterError::Transport { .. } => true,
            MeterError::File { .. } => false,
            MeterError::Parse { .. } => false,
            MeterError::OutOfBounds { .. } => false,
            MeterError::SinkFailure { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            MeterError::Transport { .. } => vec![
                "Check the instrument is powered on and in range",
                "Ensure no other host holds the BLE connection",
                "Reconnect and resubscribe to notifications",
            ],
            MeterError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            MeterError::Parse { .. } => vec![
                "Check the YAML document structure",
                "Verify field names and value ranges",
            ],
            MeterError::OutOfBounds { .. } => vec![
                "Verify the frame length matches the device layout",
                "Check the layout table offsets",
            ],
            MeterError::SinkFailure { .. } => vec![
                "Inspect the failing sink's downstream resource",
                "Unregister the sink if it cannot recover",
            ],
        }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        MeterError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        MeterError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        MeterError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        MeterError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for sink failures.
    pub fn sink_failure(
        stage: &'static str,
        sink: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MeterError::SinkFailure { stage, sink: sink.into(), reason: reason.into() }
    }
}

impl From<std::io::Error> for MeterError {
    fn from(err: std::io::Error) -> Self {
        MeterError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for MeterError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        MeterError::Parse { context: "YAML".to_string(), details: err.to_string() }
    }
}
