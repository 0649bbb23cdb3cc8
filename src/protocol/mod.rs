//! Frame reassembly and validation.
//!
//! Two wire protocols are supported:
//!
//! - [`FixedFrameReassembler`]: self-delimited fixed-length frames with a
//!   sentinel byte and XOR checksum; resynchronizes after corruption.
//! - [`ChunkPairReassembler`]: one measurement split into a 20-byte and a
//!   16-byte notification, paired by shape and arrival time; no checksum and
//!   no resynchronization.
//!
//! Both sit behind the [`Reassembler`] trait so a session can hold either.

mod fixed;
mod paired;
mod validation;

pub use fixed::FixedFrameReassembler;
pub use paired::{
    ChunkKind, ChunkPairReassembler, DEFAULT_PAIR_WINDOW_MS, FIRST_CHUNK_LEN, PAIRED_FRAME_LEN,
    SECOND_CHUNK_LEN,
};
pub use validation::{FixedFrameSpec, FrameRejection, xor_checksum};

use crate::types::{LogicalFrame, RawPacket};

/// Per-connection reassembly state machine.
///
/// `push` is the only transition: it consumes one packet in arrival order and
/// returns the frames it completed, possibly none. Implementations never see
/// concurrent calls; a session owns its reassembler exclusively.
pub trait Reassembler: Send + std::fmt::Debug {
    /// Feed the next packet and collect any completed frames.
    fn push(&mut self, packet: &RawPacket) -> Vec<LogicalFrame>;

    /// Drop all buffered state, e.g. after a reconnect.
    fn reset(&mut self);

    /// Number of bytes currently held.
    fn buffered_len(&self) -> usize;
}
