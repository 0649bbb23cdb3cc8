//! Packet and frame types flowing through the pipeline

use std::sync::Arc;

/// One characteristic-value notification exactly as the transport delivered it.
///
/// The payload may hold a fragment of a frame, a whole frame, or the tail of
/// one frame followed by the head of the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Notification payload (zero-copy via Arc)
    pub data: Arc<[u8]>,

    /// Monotonic arrival time in milliseconds
    pub arrival_ms: u64,
}

impl RawPacket {
    /// Create a new raw packet
    pub fn new(data: impl Into<Arc<[u8]>>, arrival_ms: u64) -> Self {
        Self { data: data.into(), arrival_ms }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Bytes believed to encode exactly one measurement.
///
/// Reassemblers only hand out frames that passed their protocol's integrity
/// check, so anything holding a `LogicalFrame` may decode it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalFrame {
    data: Arc<[u8]>,
}

impl LogicalFrame {
    pub(crate) fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for LogicalFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
