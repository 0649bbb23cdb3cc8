//! Time-windowed stitcher for measurements split into two notifications

use std::sync::Arc;
use tracing::{debug, trace};

use super::Reassembler;
use crate::types::{LogicalFrame, RawPacket};

/// Length of the leading half of a split measurement.
pub const FIRST_CHUNK_LEN: usize = 20;

/// Length of the trailing half of a split measurement.
pub const SECOND_CHUNK_LEN: usize = 16;

/// Length of the stitched frame.
pub const PAIRED_FRAME_LEN: usize = FIRST_CHUNK_LEN + SECOND_CHUNK_LEN;

/// Default maximum gap between the two halves, in milliseconds (exclusive).
pub const DEFAULT_PAIR_WINDOW_MS: u64 = 1000;

/// Which half of a split measurement a notification carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    First,
    Second,
}

impl ChunkKind {
    /// Classify a notification by its length and signature bytes.
    ///
    /// There is no sequence number; anything that matches neither shape
    /// returns `None`.
    pub fn classify(bytes: &[u8]) -> Option<ChunkKind> {
        match bytes.len() {
            FIRST_CHUNK_LEN if bytes[0] == 0xFF && bytes[2] == 0x01 => Some(ChunkKind::First),
            SECOND_CHUNK_LEN => Some(ChunkKind::Second),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Chunk {
    data: Arc<[u8]>,
    arrival_ms: u64,
}

impl Chunk {
    fn from_packet(packet: &RawPacket) -> Self {
        Self { data: Arc::clone(&packet.data), arrival_ms: packet.arrival_ms }
    }
}

/// Pairs a first and second chunk arriving within the window into one frame.
///
/// No checksum exists for this protocol; the pairing rules are the only
/// integrity check. Both slots are cleared after every pairing attempt, so a
/// chunk is never matched against more than one partner.
#[derive(Debug, Clone)]
pub struct ChunkPairReassembler {
    first: Option<Chunk>,
    second: Option<Chunk>,
    window_ms: u64,
}

impl ChunkPairReassembler {
    pub fn new(window_ms: u64) -> Self {
        Self { first: None, second: None, window_ms }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Consume both slots if filled, emitting when the timing is acceptable.
    fn try_pair(&mut self) -> Option<LogicalFrame> {
        if self.first.is_none() || self.second.is_none() {
            return None;
        }
        let first = self.first.take()?;
        let second = self.second.take()?;

        match second.arrival_ms.checked_sub(first.arrival_ms) {
            Some(delta) if delta < self.window_ms => {
                let mut data = Vec::with_capacity(PAIRED_FRAME_LEN);
                data.extend_from_slice(&first.data);
                data.extend_from_slice(&second.data);
                trace!(delta_ms = delta, "Paired chunks into frame");
                Some(LogicalFrame::new(data))
            }
            _ => {
                debug!(
                    first_ms = first.arrival_ms,
                    second_ms = second.arrival_ms,
                    window_ms = self.window_ms,
                    "Discarding stale or out-of-order chunk pair"
                );
                None
            }
        }
    }
}

impl Default for ChunkPairReassembler {
    fn default() -> Self {
        Self::new(DEFAULT_PAIR_WINDOW_MS)
    }
}

impl Reassembler for ChunkPairReassembler {
    fn push(&mut self, packet: &RawPacket) -> Vec<LogicalFrame> {
        match ChunkKind::classify(packet.as_bytes()) {
            Some(ChunkKind::First) => self.first = Some(Chunk::from_packet(packet)),
            Some(ChunkKind::Second) => self.second = Some(Chunk::from_packet(packet)),
            None => {
                trace!(len = packet.len(), "Ignoring unclassified packet");
                return Vec::new();
            }
        }

        self.try_pair().into_iter().collect()
    }

    fn reset(&mut self) {
        self.first = None;
        self.second = None;
    }

    fn buffered_len(&self) -> usize {
        self.first.as_ref().map_or(0, |c| c.data.len())
            + self.second.as_ref().map_or(0, |c| c.data.len())
    }
}
