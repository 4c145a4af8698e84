//! Typed publish/subscribe bus for terminal-local consumers
//!
//! The UI layer of a terminal observes order and connection activity
//! through this bus instead of global listener registries. Subscribing
//! returns a guard; dropping the guard unsubscribes, tying handler lifetime
//! to the owning component's scope.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use ol_protocol::SyncEvent;

use crate::link::ConnectionSnapshot;

/// An event delivered to bus subscribers
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// An order event that was applied to this terminal's state
    Sync(SyncEvent),
    /// The hub connection changed state
    Connection(ConnectionSnapshot),
}

/// Kind of event a handler subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NewOrder,
    UpdateOrder,
    CompleteOrder,
    CancelOrder,
    PeerCount,
    Connection,
}

impl BusEvent {
    /// The kind this event dispatches under
    pub fn kind(&self) -> EventKind {
        match self {
            BusEvent::Sync(SyncEvent::NewOrder(_)) => EventKind::NewOrder,
            BusEvent::Sync(SyncEvent::UpdateOrder(_)) => EventKind::UpdateOrder,
            BusEvent::Sync(SyncEvent::CompleteOrder(_)) => EventKind::CompleteOrder,
            BusEvent::Sync(SyncEvent::CancelOrder(_)) => EventKind::CancelOrder,
            BusEvent::Sync(SyncEvent::PeerCount(_)) => EventKind::PeerCount,
            BusEvent::Connection(_) => EventKind::Connection,
        }
    }
}

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

/// Typed publish/subscribe dispatcher
#[derive(Default)]
pub struct EventBus {
    /// Handlers per event kind, keyed by subscription token
    handlers: Mutex<HashMap<EventKind, HashMap<u64, Handler>>>,
    /// Next subscription token
    next_token: AtomicU64,
}

impl EventBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to one event kind.
    ///
    /// The handler stays registered until the returned `Subscription` is
    /// dropped.
    pub fn subscribe<F>(self: &Arc<Self>, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self.handlers.lock().expect("bus mutex poisoned");
        handlers
            .entry(kind)
            .or_default()
            .insert(token, Arc::new(handler));

        Subscription {
            bus: Arc::downgrade(self),
            kind,
            token,
        }
    }

    /// Publish an event to every handler subscribed to its kind.
    ///
    /// Handlers run on the publisher's task; they are expected to be cheap
    /// (update a view, notify a channel).
    pub fn publish(&self, event: &BusEvent) {
        let matching: Vec<Handler> = {
            let handlers = self.handlers.lock().expect("bus mutex poisoned");
            handlers
                .get(&event.kind())
                .map(|set| set.values().cloned().collect())
                .unwrap_or_default()
        };

        for handler in matching {
            handler(event);
        }
    }

    /// Number of live subscriptions for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.lock().expect("bus mutex poisoned");
        handlers.get(&kind).map(|set| set.len()).unwrap_or(0)
    }

    fn unsubscribe(&self, kind: EventKind, token: u64) {
        let mut handlers = self.handlers.lock().expect("bus mutex poisoned");
        if let Some(set) = handlers.get_mut(&kind) {
            set.remove(&token);
        }
    }
}

/// Guard representing one subscription; unsubscribes on drop
pub struct Subscription {
    bus: Weak<EventBus>,
    kind: EventKind,
    token: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.kind, self.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_publish() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        let _sub = bus.subscribe(EventKind::PeerCount, move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&BusEvent::Sync(SyncEvent::PeerCount(2)));
        bus.publish(&BusEvent::Sync(SyncEvent::PeerCount(3)));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_kind_filtering() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        let _sub = bus.subscribe(EventKind::CancelOrder, move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Different kind: not delivered
        bus.publish(&BusEvent::Sync(SyncEvent::PeerCount(1)));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = Arc::clone(&seen);
        let sub = bus.subscribe(EventKind::PeerCount, move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.subscriber_count(EventKind::PeerCount), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(EventKind::PeerCount), 0);

        bus.publish(&BusEvent::Sync(SyncEvent::PeerCount(1)));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_multiple_subscribers_same_kind() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let a = Arc::clone(&seen);
        let _sub_a = bus.subscribe(EventKind::PeerCount, move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&seen);
        let _sub_b = bus.subscribe(EventKind::PeerCount, move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&BusEvent::Sync(SyncEvent::PeerCount(5)));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
