//! Integrity checks for fixed-length, sentinel-prefixed, XOR-checksummed frames

/// Why a candidate byte sequence was rejected as a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRejection {
    /// Candidate is not exactly the frame length
    WrongLength { expected: usize, actual: usize },
    /// First byte is not the sentinel
    MissingSentinel { found: u8 },
    /// XOR over all bytes is non-zero
    ChecksumMismatch { residual: u8 },
}

/// Shape of a self-delimited fixed-length frame.
///
/// There is no length field: length, sentinel and a zero XOR residual are the
/// only correctness signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFrameSpec {
    pub frame_len: usize,
    pub sentinel: u8,
}

impl FixedFrameSpec {
    /// 121GW multimeter frames: 19 bytes starting with 0xF2.
    pub const MULTIMETER: FixedFrameSpec = FixedFrameSpec { frame_len: 19, sentinel: 0xF2 };

    pub const fn new(frame_len: usize, sentinel: u8) -> Self {
        Self { frame_len, sentinel }
    }

    /// Check a candidate frame, reporting the first failed condition.
    pub fn check(&self, candidate: &[u8]) -> Result<(), FrameRejection> {
        if candidate.len() != self.frame_len {
            return Err(FrameRejection::WrongLength {
                expected: self.frame_len,
                actual: candidate.len(),
            });
        }

        match candidate.first() {
            Some(&first) if first == self.sentinel => {}
            Some(&found) => return Err(FrameRejection::MissingSentinel { found }),
            None => return Err(FrameRejection::WrongLength { expected: self.frame_len, actual: 0 }),
        }

        match xor_checksum(candidate) {
            0 => Ok(()),
            residual => Err(FrameRejection::ChecksumMismatch { residual }),
        }
    }

    pub fn is_valid(&self, candidate: &[u8]) -> bool {
        self.check(candidate).is_ok()
    }

    /// Position of the first sentinel byte at or after `from`.
    pub fn find_sentinel(&self, bytes: &[u8], from: usize) -> Option<usize> {
        bytes.get(from..)?.iter().position(|&b| b == self.sentinel).map(|pos| from + pos)
    }
}

/// XOR of every byte, including sentinel and trailing checksum byte.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}
