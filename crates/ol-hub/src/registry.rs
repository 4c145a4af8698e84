//! Connected-peer registry
//!
//! Tracks the outbound channel of every connected terminal. All order data
//! passes through without inspection; the registry only knows who is
//! connected and how to reach them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use ol_protocol::SyncEvent;

/// Identifier assigned to a terminal connection for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub u64);

impl PeerId {
    /// Get the raw numeric id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Registry of active terminal connections
pub struct PeerRegistry {
    /// Outbound channels indexed by peer id
    peers: DashMap<PeerId, mpsc::Sender<SyncEvent>>,
    /// Next peer id to assign
    next_id: AtomicU64,
}

impl PeerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new peer, returning its assigned id
    pub fn register(&self, sender: mpsc::Sender<SyncEvent>) -> PeerId {
        let id = PeerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.peers.insert(id, sender);
        id
    }

    /// Remove a peer from the registry
    pub fn unregister(&self, id: PeerId) {
        self.peers.remove(&id);
    }

    /// Number of connected peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Rebroadcast an event to every peer except the sender.
    ///
    /// The sender already holds authoritative local state for its own
    /// mutation, so it never receives its own events back. A peer whose
    /// channel is full or closed is skipped; delivery is best-effort and
    /// must never block the hub.
    pub fn broadcast(&self, from: PeerId, event: &SyncEvent) {
        for entry in self.peers.iter() {
            let (peer, sender) = (entry.key(), entry.value());
            if *peer == from {
                continue;
            }
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!("Dropping event for {}: {}", peer, e);
            }
        }
    }

    /// Push the current peer count to every connected peer
    pub fn broadcast_peer_count(&self) {
        let count = self.len() as u32;
        for entry in self.peers.iter() {
            if let Err(e) = entry.value().try_send(SyncEvent::PeerCount(count)) {
                tracing::warn!("Dropping peer count for {}: {}", entry.key(), e);
            }
        }
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
