//! Channel-fed packet source
//!
//! For hosts whose BLE stack delivers notifications through callbacks: the
//! callback pushes into a [`PacketSender`] and the driver pulls from the
//! paired [`ChannelSource`].

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::provider::PacketSource;
use crate::types::RawPacket;
use crate::{MeterError, Result};

/// Sending half handed to the transport callback.
#[derive(Debug, Clone)]
pub struct PacketSender {
    tx: mpsc::Sender<RawPacket>,
}

impl PacketSender {
    /// Queue a notification, waiting if the channel is full.
    pub async fn send(&self, bytes: &[u8], arrival_ms: u64) -> Result<()> {
        self.tx
            .send(RawPacket::new(bytes, arrival_ms))
            .await
            .map_err(|_| MeterError::transport_failed("packet channel closed"))
    }

    /// Queue a notification without waiting.
    pub fn try_send(&self, bytes: &[u8], arrival_ms: u64) -> Result<()> {
        self.tx.try_send(RawPacket::new(bytes, arrival_ms)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                MeterError::transport_failed("packet channel full")
            }
            mpsc::error::TrySendError::Closed(_) => {
                MeterError::transport_failed("packet channel closed")
            }
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half consumed by the driver. Ends once every sender is dropped.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<RawPacket>,
    received: u64,
}

impl ChannelSource {
    /// Create a bounded source and its sender.
    pub fn new(capacity: usize) -> (PacketSender, ChannelSource) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (PacketSender { tx }, ChannelSource { rx, received: 0 })
    }
}

#[async_trait::async_trait]
impl PacketSource for ChannelSource {
    async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
        match self.rx.recv().await {
            Some(packet) => {
                self.received += 1;
                trace!("Channel packet {}: {} bytes", self.received, packet.len());
                Ok(Some(packet))
            }
            None => {
                debug!("All packet senders dropped after {} packets", self.received);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_order_then_ends() {
        let (tx, mut source) = ChannelSource::new(4);
        tx.send(&[1, 2], 10).await.unwrap();
        tx.send(&[3], 20).await.unwrap();
        drop(tx);

        let first = source.next_packet().await.unwrap().unwrap();
        assert_eq!(first.as_bytes(), &[1, 2]);
        assert_eq!(first.arrival_ms, 10);
        let second = source.next_packet().await.unwrap().unwrap();
        assert_eq!(second.arrival_ms, 20);
        assert!(source.next_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn send_after_source_dropped_is_transport_error() {
        let (tx, source) = ChannelSource::new(1);
        drop(source);

        assert!(tx.is_closed());
        let err = tx.send(&[0xF2], 0).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, MeterError::Transport { .. }));
    }

    #[test]
    fn try_send_reports_full_channel() {
        let (tx, _source) = ChannelSource::new(1);
        tx.try_send(&[1], 0).unwrap();
        let err = tx.try_send(&[2], 1).unwrap_err();
        assert!(err.to_string().contains("full"));
    }
}
