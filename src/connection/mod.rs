//! Connection lifecycle bookkeeping.
//!
//! The BLE transport itself lives outside this crate. What the pipeline needs
//! from it is narrow:
//!
//! - a transient link error may be retried up to [`MAX_RECONNECT_ATTEMPTS`]
//!   times before the host gives up, and
//! - a disconnect is reported once per genuine disconnect, and only for the
//!   connection currently being tracked.
//!
//! [`ConnectionTracker`] enforces the second rule so late events from an
//! earlier connection cannot tear down a newer one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::MeterError;

#[cfg(test)]
mod tests;

/// Reconnect attempts a host makes on a transient link error.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 2;

/// Whether a host that has already made `attempts` reconnects should try again.
pub fn should_reconnect(error: &MeterError, attempts: u32) -> bool {
    error.is_retryable() && attempts < MAX_RECONNECT_ATTEMPTS
}

/// Identity of one connection handed out by a [`ConnectionTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Callback for confirmed disconnects.
#[async_trait]
pub trait DisconnectListener: Send + Sync {
    async fn on_disconnect(&self, connection: ConnectionId);
}

/// Tracks the live connection and filters disconnect events against it.
#[derive(Default)]
pub struct ConnectionTracker {
    current: Option<ConnectionId>,
    next_id: u64,
    reported: bool,
    listeners: Vec<Arc<dyn DisconnectListener>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new connection, replacing any previous one.
    pub fn connect(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        if let Some(previous) = self.current.replace(id) {
            debug!("Connection {} superseded by {}", previous, id);
        }
        self.reported = false;
        info!("Tracking connection {}", id);
        id
    }

    /// The connection currently tracked, if any.
    pub fn current(&self) -> Option<ConnectionId> {
        self.current
    }

    /// Whether the tracked connection is up and has not been reported gone.
    pub fn is_connected(&self) -> bool {
        self.current.is_some() && !self.reported
    }

    /// Register a listener. Returns `false` if it was already registered.
    pub fn add_listener(&mut self, listener: Arc<dyn DisconnectListener>) -> bool {
        if self.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, listener: &Arc<dyn DisconnectListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Handle a disconnect event raised by the transport.
    ///
    /// Listeners run in registration order, and only when `connection` is the
    /// tracked one, the transport reports the link as down (`still_connected`
    /// is false), and this disconnect has not been reported already. Returns
    /// whether listeners were notified.
    pub async fn handle_disconnect(
        &mut self,
        connection: ConnectionId,
        still_connected: bool,
    ) -> bool {
        if self.current != Some(connection) {
            debug!("Ignoring disconnect from stale connection {}", connection);
            return false;
        }
        if still_connected {
            debug!("Ignoring disconnect event for {}: link still up", connection);
            return false;
        }
        if self.reported {
            debug!("Disconnect of {} already reported", connection);
            return false;
        }

        self.reported = true;
        info!("Connection {} closed, notifying {} listeners", connection, self.listeners.len());
        for listener in &self.listeners {
            listener.on_disconnect(connection).await;
        }
        true
    }
}

impl fmt::Debug for ConnectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTracker")
            .field("current", &self.current)
            .field("reported", &self.reported)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
