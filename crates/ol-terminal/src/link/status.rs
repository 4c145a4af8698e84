//! Shared link liveness state
//!
//! Written by the link I/O task, read by the connection monitor and
//! anything else that wants a cheap liveness check.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Point-in-time view of the hub connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionSnapshot {
    /// Whether the link to the hub is currently up
    pub connected: bool,
    /// Last peer count received from the hub
    pub peer_count: u32,
}

/// Live connection state, shared between the link task and observers
#[derive(Debug, Default)]
pub struct LinkStatus {
    connected: AtomicBool,
    peer_count: AtomicU32,
}

impl LinkStatus {
    /// Create a new status in the disconnected state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the link is currently up
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Last peer count received from the hub
    pub fn peer_count(&self) -> u32 {
        self.peer_count.load(Ordering::Relaxed)
    }

    /// Record a connection state change
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Record a peer count received from the hub
    pub fn set_peer_count(&self, count: u32) {
        self.peer_count.store(count, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot for display purposes
    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            connected: self.is_connected(),
            peer_count: self.peer_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let status = LinkStatus::new();
        assert!(!status.is_connected());
        assert_eq!(status.peer_count(), 0);
    }

    #[test]
    fn test_snapshot_reflects_updates() {
        let status = LinkStatus::new();
        status.set_connected(true);
        status.set_peer_count(3);

        let snap = status.snapshot();
        assert!(snap.connected);
        assert_eq!(snap.peer_count, 3);
    }
}
