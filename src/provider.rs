//! Packet source trait for transports

use crate::Result;
use crate::types::RawPacket;

/// A stream of notification payloads from one connection.
///
/// Transports implement this to plug into [`crate::driver::Driver`]. Packets
/// must come out in arrival order with their arrival timestamps already
/// stamped.
#[async_trait::async_trait]
pub trait PacketSource: Send + 'static {
    /// Wait for the next notification.
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - A notification arrived
    /// - `Ok(None)` - The source ended (normal termination)
    /// - `Err(e)` - The transport failed; see [`crate::MeterError::is_retryable`]
    async fn next_packet(&mut self) -> Result<Option<RawPacket>>;
}
