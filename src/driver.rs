//! Driver pumps a packet source into a session on its own task

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::provider::PacketSource;
use crate::session::{DeviceSession, SessionStats};
use crate::{MeterError, Result};

/// Handle to a running driver task.
#[derive(Debug)]
pub struct DriverHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<SessionStats>>,
}

impl DriverHandle {
    /// Request a graceful stop. The packet in flight, if any, finishes first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to end and collect the session totals.
    pub async fn join(self) -> Result<SessionStats> {
        self.task.await.map_err(|e| {
            MeterError::transport_failed_with_source("driver task aborted", Box::new(e))
        })?
    }
}

/// Driver spawns the packet pump
///
/// One task owns both the source and the session, so packets reach the
/// pipeline strictly one at a time in arrival order. Sinks and record
/// subscriptions must be set up on the session before it is handed over.
pub struct Driver;

impl Driver {
    /// Spawn the pump. It ends when the source ends, on cancellation, or on
    /// the first source error or fatal sink failure.
    pub fn spawn<S>(source: S, session: DeviceSession) -> DriverHandle
    where
        S: PacketSource,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::pump(source, session, cancel.clone()));
        DriverHandle { cancel, task }
    }

    async fn pump<S>(
        mut source: S,
        mut session: DeviceSession,
        cancel: CancellationToken,
    ) -> Result<SessionStats>
    where
        S: PacketSource,
    {
        info!("Driver started for {} session", session.kind());

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Driver cancelled");
                    break;
                }
                next = source.next_packet() => next,
            };

            let packet = match next {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    debug!("Packet source ended");
                    break;
                }
                Err(e) => {
                    error!("Packet source failed: {}", e);
                    return Err(e);
                }
            };

            match session.ingest(packet).await {
                Ok(report) => trace!("Ingested packet: {:?}", report),
                Err(e) => {
                    error!("Pipeline stopped: {}", e);
                    return Err(e);
                }
            }
        }

        let stats = session.stats();
        info!(
            "Driver ended: {} packets, {} frames, {} records",
            stats.packets, stats.frames, stats.records
        );
        Ok(stats)
    }
}
