//! Per-connection measurement pipeline.
//!
//! A [`DeviceSession`] owns one device's reassembly state, its sink registry,
//! and a broadcast channel of decoded records. Packets go in through
//! [`DeviceSession::on_packet`]; for each one the session
//!
//! 1. dispatches the raw packet,
//! 2. feeds it to the reassembler,
//! 3. dispatches every completed frame,
//! 4. decodes each frame and dispatches and broadcasts the record.
//!
//! `on_packet` takes `&mut self`, so a session can never be re-entered while a
//! packet is still in flight. Independent sessions share nothing.

use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, trace, warn};

use crate::config::PipelineConfig;
use crate::device::{Device, DeviceKind};
use crate::dispatch::{Dispatcher, Event, Sink};
use crate::protocol::Reassembler;
use crate::stream::ThrottleExt;
use crate::types::{MeasurementRecord, RawPacket, UpdateRate};
use crate::{MeterError, Result};

/// Outcome of ingesting one packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Frames the packet completed
    pub frames: usize,
    /// Records decoded from those frames
    pub records: usize,
}

/// Running totals for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct SessionStats {
    pub packets: u64,
    pub frames: u64,
    pub records: u64,
    /// Frames the decoder did not recognize
    pub undecoded: u64,
}

/// The measurement pipeline for one connected instrument.
pub struct DeviceSession {
    device: Arc<dyn Device>,
    reassembler: Box<dyn Reassembler>,
    dispatcher: Dispatcher,
    records: broadcast::Sender<MeasurementRecord>,
    config: PipelineConfig,
    stats: SessionStats,
}

impl DeviceSession {
    /// Build a session with fresh reassembly state for `device`.
    pub fn new(device: Arc<dyn Device>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let reassembler = device.reassembler(&config);
        let (records, _) = broadcast::channel(config.record_channel_capacity);

        info!("Opened {} session", device.kind());

        Ok(Self {
            device,
            reassembler,
            dispatcher: Dispatcher::new(),
            records,
            config,
            stats: SessionStats::default(),
        })
    }

    pub fn kind(&self) -> DeviceKind {
        self.device.kind()
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Register a sink. Registering the same `Arc` twice has no effect.
    pub fn register(&mut self, sink: Arc<dyn Sink>) -> bool {
        self.dispatcher.register(sink)
    }

    /// Unregister a sink. Unknown sinks are ignored.
    pub fn unregister(&mut self, sink: &Arc<dyn Sink>) -> bool {
        self.dispatcher.unregister(sink)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Ingest one notification payload.
    ///
    /// Framing problems and unknown modes never fail this call. The only
    /// error is a fatal sink failure; see [`crate::dispatch`] for the policy.
    /// That failure is reported only after the packet has been reassembled
    /// and every frame it completed has been dispatched, decoded and
    /// broadcast.
    pub async fn on_packet(&mut self, bytes: &[u8], arrival_ms: u64) -> Result<IngestReport> {
        self.ingest(RawPacket::new(bytes, arrival_ms)).await
    }

    /// Ingest an already wrapped packet.
    pub async fn ingest(&mut self, packet: RawPacket) -> Result<IngestReport> {
        self.stats.packets += 1;
        trace!("Packet {}: {} bytes at {}ms", self.stats.packets, packet.len(), packet.arrival_ms);

        let mut failure = None;
        let dispatched = self.dispatcher.dispatch(Event::RawPacket(&packet)).await;
        keep_first(&mut failure, dispatched);

        // A failing sink never costs the packet: its bytes are reassembled and
        // every completed frame is carried through.
        let frames = self.reassembler.push(&packet);
        let mut report = IngestReport { frames: frames.len(), records: 0 };

        for frame in &frames {
            self.stats.frames += 1;
            let dispatched = self.dispatcher.dispatch(Event::Frame(frame)).await;
            keep_first(&mut failure, dispatched);

            let Some(record) = self.device.decode(frame) else {
                self.stats.undecoded += 1;
                continue;
            };

            self.stats.records += 1;
            report.records += 1;
            let dispatched = self.dispatcher.dispatch(Event::Record(&record)).await;
            keep_first(&mut failure, dispatched);

            // No subscribers is fine
            let _ = self.records.send(record);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Subscribe to decoded records at the given rate.
    ///
    /// Records decoded before the call are not replayed. A subscriber that
    /// falls more than `record_channel_capacity` records behind skips the
    /// missed ones. The stream ends when the session is dropped.
    pub fn subscribe_records(&self, rate: UpdateRate) -> BoxStream<'static, MeasurementRecord> {
        let stream = BroadcastStream::new(self.records.subscribe()).filter_map(|item| async move {
            match item {
                Ok(record) => Some(record),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("Record subscriber lagged, skipped {} records", skipped);
                    None
                }
            }
        });

        match rate.throttle_interval() {
            Some(interval) => {
                debug!("Record subscription throttled to {:?}", interval);
                stream.throttle(interval).boxed()
            }
            None => stream.boxed(),
        }
    }

    /// Subscribe at the configured default rate.
    pub fn subscribe(&self) -> BoxStream<'static, MeasurementRecord> {
        self.subscribe_records(self.config.update_rate)
    }

    /// Drop all buffered reassembly state, e.g. after a reconnect.
    pub fn reset(&mut self) {
        debug!(
            "Resetting {} session ({} bytes buffered)",
            self.device.kind(),
            self.reassembler.buffered_len()
        );
        self.reassembler.reset();
    }

    pub fn buffered_len(&self) -> usize {
        self.reassembler.buffered_len()
    }
}

fn keep_first(failure: &mut Option<MeterError>, outcome: Result<()>) {
    if let Err(err) = outcome {
        failure.get_or_insert(err);
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device", &self.device)
            .field("reassembler", &self.reassembler)
            .field("dispatcher", &self.dispatcher)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{EnergyMeter, Multimeter};
    use crate::dispatch::SinkError;
    use crate::test_utils::{energy_meter_chunks, multimeter_frame};
    use crate::types::LogicalFrame;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RejectFrames;

    #[async_trait]
    impl Sink for RejectFrames {
        fn name(&self) -> &str {
            "reject_frames"
        }

        async fn on_frame(&self, _frame: &LogicalFrame) -> Result<(), SinkError> {
            Err(SinkError::Fatal("storage gone".into()))
        }
    }

    #[derive(Default)]
    struct CountFrames(AtomicUsize);

    #[async_trait]
    impl Sink for CountFrames {
        async fn on_frame(&self, _frame: &LogicalFrame) -> Result<(), SinkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn multimeter() -> DeviceSession {
        DeviceSession::new(Arc::new(Multimeter), PipelineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn multimeter_frame_produces_record() {
        let mut session = multimeter();
        let frame = multimeter_frame(0x2345_6789, 1);

        let report = session.on_packet(&frame, 0).await.unwrap();
        assert_eq!(report, IngestReport { frames: 1, records: 1 });
        assert_eq!(session.stats().packets, 1);
        assert_eq!(session.buffered_len(), 0);
    }

    #[tokio::test]
    async fn energy_meter_pair_produces_record() {
        let mut session =
            DeviceSession::new(Arc::new(EnergyMeter), PipelineConfig::default()).unwrap();
        let (first, second) = energy_meter_chunks(1, 1234);

        assert_eq!(session.on_packet(&first, 0).await.unwrap().frames, 0);
        let report = session.on_packet(&second, 500).await.unwrap();
        assert_eq!(report, IngestReport { frames: 1, records: 1 });
    }

    #[tokio::test]
    async fn unknown_mode_counts_as_undecoded() {
        let mut session =
            DeviceSession::new(Arc::new(EnergyMeter), PipelineConfig::default()).unwrap();
        let (first, second) = energy_meter_chunks(9, 1234);

        session.on_packet(&first, 0).await.unwrap();
        let report = session.on_packet(&second, 10).await.unwrap();
        assert_eq!(report, IngestReport { frames: 1, records: 0 });
        assert_eq!(session.stats().undecoded, 1);
    }

    #[tokio::test]
    async fn reset_discards_partial_frame() {
        let mut session = multimeter();
        let frame = multimeter_frame(0x2345_6789, 1);

        session.on_packet(&frame[..7], 0).await.unwrap();
        assert_eq!(session.buffered_len(), 7);
        session.reset();
        assert_eq!(session.buffered_len(), 0);
    }

    #[tokio::test]
    async fn fatal_frame_sink_does_not_drop_later_frames() {
        let mut session = multimeter();
        let counter = Arc::new(CountFrames::default());
        session.register(Arc::new(RejectFrames));
        session.register(counter.clone());
        let mut records = session.subscribe_records(UpdateRate::Native);

        let mut packet = vec![0x00];
        packet.extend(multimeter_frame(0x2171_2345, 1));
        packet.extend(multimeter_frame(0x2171_2345, 42));

        let err = session.on_packet(&packet, 0).await.unwrap_err();
        assert!(matches!(
            err,
            MeterError::SinkFailure { ref stage, ref sink, .. }
                if *stage == "frame" && sink == "reject_frames"
        ));

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert_eq!(session.buffered_len(), 0);
        assert_eq!(session.stats().records, 2);

        let values: Vec<u32> = [records.next().await, records.next().await]
            .into_iter()
            .map(|r| r.unwrap().as_multimeter().unwrap().main_value)
            .collect();
        assert_eq!(values, vec![1, 42]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig { record_channel_capacity: 0, ..PipelineConfig::default() };
        assert!(DeviceSession::new(Arc::new(Multimeter), config).is_err());
    }
}
