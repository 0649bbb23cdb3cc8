//! Fan-out of pipeline events to registered sinks.
//!
//! Every raw packet, validated frame, and decoded record is offered to each
//! registered [`Sink`] in registration order. Sinks run one after another and
//! each event finishes with all of them before the session accepts the next
//! packet.
//!
//! # Failure policy
//!
//! A sink returns [`SinkError::Recoverable`] for problems it can shrug off
//! (a full UI queue, a dropped log line). The dispatcher logs a warning,
//! counts it, and moves on.
//!
//! [`SinkError::Fatal`] means the sink can no longer do its job. The remaining
//! sinks still see the event, then the dispatch fails with
//! [`MeterError::SinkFailure`] naming the first fatal sink and the stage. The
//! session finishes the packet before surfacing it; the caller decides
//! whether to keep feeding packets or to unregister the sink.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, trace, warn};

use crate::types::{LogicalFrame, MeasurementRecord, RawPacket};
use crate::{MeterError, Result};

/// Failure reported by a sink callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("recoverable: {0}")]
    Recoverable(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl SinkError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SinkError::Fatal(_))
    }
}

/// Observer of pipeline events. Every callback defaults to a no-op.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name used in logs and in [`MeterError::SinkFailure`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Every packet, before reassembly.
    async fn on_raw_packet(&self, _packet: &RawPacket) -> Result<(), SinkError> {
        Ok(())
    }

    /// Every validated frame, before decoding.
    async fn on_frame(&self, _frame: &LogicalFrame) -> Result<(), SinkError> {
        Ok(())
    }

    /// Every decoded record.
    async fn on_record(&self, _record: &MeasurementRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A single pipeline event.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    RawPacket(&'a RawPacket),
    Frame(&'a LogicalFrame),
    Record(&'a MeasurementRecord),
}

impl Event<'_> {
    /// Stage name reported in sink failures.
    pub fn stage(&self) -> &'static str {
        match self {
            Event::RawPacket(_) => "raw_packet",
            Event::Frame(_) => "frame",
            Event::Record(_) => "record",
        }
    }
}

/// Ordered registry of sinks with idempotent registration.
///
/// Identity is the `Arc` allocation: registering a clone of an already
/// registered `Arc` does nothing.
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Arc<dyn Sink>>,
    recovered: u64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink. Returns `false` if it was already registered.
    pub fn register(&mut self, sink: Arc<dyn Sink>) -> bool {
        if self.contains(&sink) {
            return false;
        }
        self.sinks.push(sink);
        true
    }

    /// Remove a sink. Returns `false` if it was not registered.
    pub fn unregister(&mut self, sink: &Arc<dyn Sink>) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|s| !Arc::ptr_eq(s, sink));
        self.sinks.len() != before
    }

    pub fn contains(&self, sink: &Arc<dyn Sink>) -> bool {
        self.sinks.iter().any(|s| Arc::ptr_eq(s, sink))
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Recoverable sink failures seen so far.
    pub fn recovered_failures(&self) -> u64 {
        self.recovered
    }

    /// Offer one event to every sink in order.
    pub async fn dispatch(&mut self, event: Event<'_>) -> Result<()> {
        let stage = event.stage();
        let mut fatal: Option<MeterError> = None;

        for sink in &self.sinks {
            let outcome = match event {
                Event::RawPacket(packet) => sink.on_raw_packet(packet).await,
                Event::Frame(frame) => sink.on_frame(frame).await,
                Event::Record(record) => sink.on_record(record).await,
            };

            match outcome {
                Ok(()) => trace!("Sink '{}' handled {} event", sink.name(), stage),
                Err(SinkError::Recoverable(reason)) => {
                    self.recovered += 1;
                    warn!("Sink '{}' failed during {} dispatch: {}", sink.name(), stage, reason);
                }
                Err(SinkError::Fatal(reason)) => {
                    error!(
                        "Sink '{}' failed fatally during {} dispatch: {}",
                        sink.name(),
                        stage,
                        reason
                    );
                    if fatal.is_none() {
                        fatal = Some(MeterError::sink_failure(stage, sink.name(), reason));
                    }
                }
            }
        }

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("recovered", &self.recovered)
            .finish()
    }
}
