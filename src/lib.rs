//! Streaming frame reassembly and measurement decoding for BLE instruments.
//!
//! meterlink turns the raw characteristic-value notifications of a HiDANCE USB
//! energy meter or an EEVBlog 121GW multimeter into typed, scaled measurement
//! records. The Bluetooth transport stays with the host; this crate takes the
//! bytes it delivers.
//!
//! # Features
//!
//! - **Self-synchronizing reassembly**: fixed-length checksummed frames recover
//!   alignment after corruption
//! - **Chunk pairing**: split readings are stitched by shape and arrival time
//! - **Table-driven decoding**: each device mode is a fixed big-endian layout
//! - **Observers**: raw packets, frames and records fan out to registered sinks
//!
//! # Quick Start
//!
//! ```rust
//! use meterlink::{Meterlink, PipelineConfig, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> meterlink::Result<()> {
//!     let mut session = Meterlink::energy_meter(PipelineConfig::default())?;
//!     let mut records = session.subscribe_records(UpdateRate::Native);
//!
//!     let mut first = [0u8; 20];
//!     first[..7].copy_from_slice(&[0xFF, 0x55, 0x01, 0x01, 0x00, 0x04, 0xD2]);
//!     session.on_packet(&first, 0).await?;
//!     session.on_packet(&[0u8; 16], 40).await?;
//!
//!     let record = records.next().await.unwrap();
//!     assert_eq!(record.as_energy_meter().unwrap().voltage_v(), 123.4);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire protocol
pub mod decode;
pub mod device;
pub mod protocol;

// Pipeline
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod session;

// Stream-based ingestion
pub mod driver;
pub mod provider;
pub mod providers;
pub mod stream;

// Core exports
pub use error::*;
pub use types::*;

pub use config::PipelineConfig;
pub use connection::{ConnectionId, ConnectionTracker, DisconnectListener, MAX_RECONNECT_ATTEMPTS};
pub use device::{Device, DeviceFilter, DeviceKind, Discovery, EnergyMeter, Multimeter, ServiceIds};
pub use dispatch::{Sink, SinkError};
pub use driver::{Driver, DriverHandle};
pub use provider::PacketSource;
pub use providers::{CaptureSource, ChannelSource, PacketSender};
pub use session::{DeviceSession, IngestReport, SessionStats};

use std::sync::Arc;

/// Unified entry point for measurement sessions.
///
/// ```rust
/// use meterlink::{DeviceKind, Meterlink, PipelineConfig};
///
/// let session = Meterlink::multimeter(PipelineConfig::default()).unwrap();
/// assert_eq!(session.kind(), DeviceKind::Multimeter);
/// ```
pub struct Meterlink;

impl Meterlink {
    /// Session for a USB energy meter.
    pub fn energy_meter(config: PipelineConfig) -> Result<DeviceSession> {
        DeviceSession::new(Arc::new(EnergyMeter), config)
    }

    /// Session for a 121GW multimeter.
    pub fn multimeter(config: PipelineConfig) -> Result<DeviceSession> {
        DeviceSession::new(Arc::new(Multimeter), config)
    }

    /// Session for the given device family.
    pub fn session(kind: DeviceKind, config: PipelineConfig) -> Result<DeviceSession> {
        match kind {
            DeviceKind::EnergyMeter => Self::energy_meter(config),
            DeviceKind::Multimeter => Self::multimeter(config),
        }
    }

    /// Replay a recorded capture through a new session on a driver task.
    ///
    /// Sinks cannot be registered on the session once the driver owns it, so
    /// this returns the record stream alongside the handle.
    pub fn replay<P: AsRef<std::path::Path>>(
        kind: DeviceKind,
        capture: P,
        config: PipelineConfig,
    ) -> Result<(DriverHandle, futures::stream::BoxStream<'static, MeasurementRecord>)> {
        let source = CaptureSource::open(capture)?;
        let session = Self::session(kind, config)?;
        let records = session.subscribe();
        Ok((Driver::spawn(source, session), records))
    }
}
