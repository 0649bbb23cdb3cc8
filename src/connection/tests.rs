//! Disconnect filtering and listener registry tests

use super::*;
use std::sync::Mutex;

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<ConnectionId>>,
}

#[async_trait]
impl DisconnectListener for Recorder {
    async fn on_disconnect(&self, connection: ConnectionId) {
        self.seen.lock().unwrap().push(connection);
    }
}

fn tracker_with_recorder() -> (ConnectionTracker, Arc<Recorder>) {
    let mut tracker = ConnectionTracker::new();
    let recorder = Arc::new(Recorder::default());
    tracker.add_listener(recorder.clone());
    (tracker, recorder)
}

#[tokio::test]
async fn disconnect_is_reported_once() {
    let _ = tracing_subscriber::fmt::try_init();
    let (mut tracker, recorder) = tracker_with_recorder();
    let id = tracker.connect();

    assert!(tracker.handle_disconnect(id, false).await);
    assert!(!tracker.handle_disconnect(id, false).await);
    assert_eq!(*recorder.seen.lock().unwrap(), vec![id]);
    assert!(!tracker.is_connected());
}

#[tokio::test]
async fn stale_connection_is_ignored() {
    let (mut tracker, recorder) = tracker_with_recorder();
    let old = tracker.connect();
    let new = tracker.connect();
    assert_ne!(old, new);

    assert!(!tracker.handle_disconnect(old, false).await);
    assert!(tracker.is_connected());
    assert!(recorder.seen.lock().unwrap().is_empty());

    assert!(tracker.handle_disconnect(new, false).await);
    assert_eq!(*recorder.seen.lock().unwrap(), vec![new]);
}

#[tokio::test]
async fn event_while_link_is_up_is_ignored() {
    let (mut tracker, recorder) = tracker_with_recorder();
    let id = tracker.connect();

    assert!(!tracker.handle_disconnect(id, true).await);
    assert!(recorder.seen.lock().unwrap().is_empty());
    assert!(tracker.handle_disconnect(id, false).await);
}

#[tokio::test]
async fn reconnect_rearms_reporting() {
    let (mut tracker, recorder) = tracker_with_recorder();
    let first = tracker.connect();
    tracker.handle_disconnect(first, false).await;

    let second = tracker.connect();
    assert!(tracker.handle_disconnect(second, false).await);
    assert_eq!(*recorder.seen.lock().unwrap(), vec![first, second]);
}

#[tokio::test]
async fn untracked_tracker_ignores_everything() {
    let (mut tracker, _) = tracker_with_recorder();
    let mut other = ConnectionTracker::new();
    let foreign = other.connect();
    assert!(!tracker.handle_disconnect(foreign, false).await);
}

#[test]
fn listener_registry_is_idempotent() {
    let mut tracker = ConnectionTracker::new();
    let listener: Arc<dyn DisconnectListener> = Arc::new(Recorder::default());

    assert!(tracker.add_listener(Arc::clone(&listener)));
    assert!(!tracker.add_listener(Arc::clone(&listener)));
    assert_eq!(tracker.listener_count(), 1);
    assert!(tracker.remove_listener(&listener));
    assert!(!tracker.remove_listener(&listener));
    assert_eq!(tracker.listener_count(), 0);
}

#[test]
fn reconnect_budget_applies_to_transport_errors_only() {
    let transient = MeterError::transport_failed("GATT operation failed");
    assert!(should_reconnect(&transient, 0));
    assert!(should_reconnect(&transient, 1));
    assert!(!should_reconnect(&transient, MAX_RECONNECT_ATTEMPTS));

    let parse = MeterError::parse_error("config", "bad");
    assert!(!should_reconnect(&parse, 0));
}

#[test]
fn connection_ids_display() {
    let mut tracker = ConnectionTracker::new();
    assert_eq!(tracker.connect().to_string(), "conn-0");
    assert_eq!(tracker.connect().to_string(), "conn-1");
}
