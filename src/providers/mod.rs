//! Packet source implementations

pub mod capture;
pub mod channel;

pub use capture::{CaptureEntry, CaptureSource};
pub use channel::{ChannelSource, PacketSender};
