//! Self-synchronizing reassembler for fixed-length checksummed frames

use tracing::trace;

use super::Reassembler;
use super::validation::FixedFrameSpec;
use crate::types::{LogicalFrame, RawPacket};

/// Reassembles fixed-length frames that may be split across, or share,
/// notifications.
///
/// The scratch buffer always either is empty or starts with a sentinel byte.
/// Rejected candidates are advanced past one byte at a time, so a corrupted
/// frame never desynchronizes the frames that follow it.
#[derive(Debug, Clone)]
pub struct FixedFrameReassembler {
    spec: FixedFrameSpec,
    buffer: Vec<u8>,
}

impl FixedFrameReassembler {
    pub fn new(spec: FixedFrameSpec) -> Self {
        Self { spec, buffer: Vec::with_capacity(spec.frame_len * 3) }
    }

    pub fn spec(&self) -> FixedFrameSpec {
        self.spec
    }

    /// Pull every complete candidate off the front of the buffer.
    fn drain_frames(&mut self, frames: &mut Vec<LogicalFrame>) {
        let frame_len = self.spec.frame_len;

        while self.buffer.len() >= frame_len {
            let candidate = &self.buffer[..frame_len];
            match self.spec.check(candidate) {
                Ok(()) => {
                    frames.push(LogicalFrame::new(candidate));
                    self.skip_to_next_sentinel(frame_len);
                }
                Err(rejection) => {
                    trace!(?rejection, buffered = self.buffer.len(), "Rejected frame candidate");
                    self.skip_to_next_sentinel(1);
                }
            }
        }
    }

    /// Drop the first `n` bytes, then everything up to the next sentinel.
    fn skip_to_next_sentinel(&mut self, n: usize) {
        match self.spec.find_sentinel(&self.buffer, n) {
            Some(start) => {
                self.buffer.drain(..start);
            }
            None => {
                if !self.buffer.is_empty() {
                    trace!(discarded = self.buffer.len(), "No sentinel left, clearing buffer");
                }
                self.buffer.clear();
            }
        }
    }
}

impl Reassembler for FixedFrameReassembler {
    fn push(&mut self, packet: &RawPacket) -> Vec<LogicalFrame> {
        let bytes = packet.as_bytes();
        let mut frames = Vec::new();

        if self.buffer.is_empty() {
            if self.spec.is_valid(bytes) {
                // Aligned notification carrying exactly one frame
                frames.push(LogicalFrame::new(bytes));
                return frames;
            }

            match self.spec.find_sentinel(bytes, 0) {
                Some(start) => self.buffer.extend_from_slice(&bytes[start..]),
                None => {
                    trace!(len = bytes.len(), "Discarding packet without sentinel");
                    return frames;
                }
            }
        } else {
            self.buffer.extend_from_slice(bytes);
        }

        self.drain_frames(&mut frames);
        frames
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}
