//! Connection monitor
//!
//! Samples the link's liveness flag on a fixed interval and surfaces a
//! connected/peer-count signal to the UI. Reconnection itself is the
//! transport layer's job; the monitor only observes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::{BusEvent, EventBus};
use crate::link::{ConnectionSnapshot, LinkStatus};

/// Polls link liveness and publishes status transitions
pub struct ConnectionMonitor {
    status: Arc<LinkStatus>,
    interval: Duration,
    bus: Arc<EventBus>,
}

impl ConnectionMonitor {
    /// Create a monitor over shared link status
    pub fn new(status: Arc<LinkStatus>, interval: Duration, bus: Arc<EventBus>) -> Self {
        Self {
            status,
            interval,
            bus,
        }
    }

    /// Start polling.
    ///
    /// Returns a watch channel that always holds the latest snapshot, plus
    /// the polling task's handle. A transition (connected flag or peer
    /// count change) is also published to the bus.
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> (watch::Receiver<ConnectionSnapshot>, JoinHandle<()>) {
        let initial = self.status.snapshot();
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut last = initial;
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let snapshot = self.status.snapshot();
                        if snapshot != last {
                            tracing::info!(
                                "Connection status: {} ({} terminals)",
                                if snapshot.connected { "connected" } else { "disconnected" },
                                snapshot.peer_count
                            );
                            let _ = tx.send(snapshot);
                            self.bus.publish(&BusEvent::Connection(snapshot));
                            last = snapshot;
                        }
                    }
                }
            }
        });

        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_monitor_reports_transition() {
        let status = Arc::new(LinkStatus::new());
        let bus = Arc::new(EventBus::new());
        let cancel = CancellationToken::new();

        let monitor =
            ConnectionMonitor::new(Arc::clone(&status), Duration::from_millis(100), bus);
        let (mut rx, handle) = monitor.spawn(cancel.clone());

        assert!(!rx.borrow().connected);

        status.set_connected(true);
        status.set_peer_count(2);

        tokio::time::advance(Duration::from_millis(250)).await;
        rx.changed().await.unwrap();

        let snapshot = *rx.borrow();
        assert!(snapshot.connected);
        assert_eq!(snapshot.peer_count, 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_silent_without_change() {
        let status = Arc::new(LinkStatus::new());
        let bus = Arc::new(EventBus::new());
        let cancel = CancellationToken::new();

        let monitor =
            ConnectionMonitor::new(Arc::clone(&status), Duration::from_millis(100), bus);
        let (rx, handle) = monitor.spawn(cancel.clone());

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!rx.has_changed().unwrap());

        cancel.cancel();
        handle.await.unwrap();
    }
}
