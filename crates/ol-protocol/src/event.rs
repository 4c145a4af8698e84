//! Sync event types
//!
//! This module defines the events exchanged between terminals through the
//! relay hub. Events are serialized into frames using the codec defined in
//! `codec.rs`.
//!
//! # Event Flow
//!
//! 1. A terminal commits a mutation to its local ledger
//! 2. The terminal emits the matching event to the hub
//! 3. The hub rebroadcasts the event verbatim to every other terminal
//! 4. Each receiving terminal overwrites its replica by order id
//!
//! `PeerCount` is the one hub-originated event: it is sent to all
//! connections whenever a terminal connects or disconnects.

use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderId};

/// Event type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventType {
    /// A newly created order
    NewOrder = 0x01,
    /// An order whose status changed (not to completed)
    UpdateOrder = 0x02,
    /// An order that reached the completed state
    CompleteOrder = 0x03,
    /// An order removed from the ledger
    CancelOrder = 0x04,
    /// Number of currently connected terminals (hub to terminals)
    PeerCount = 0x05,
}

impl EventType {
    /// Convert to u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::NewOrder),
            0x02 => Some(Self::UpdateOrder),
            0x03 => Some(Self::CompleteOrder),
            0x04 => Some(Self::CancelOrder),
            0x05 => Some(Self::PeerCount),
            _ => None,
        }
    }
}

/// A state-change event, carrying a full order snapshot.
///
/// Receivers always overwrite by id rather than patching fields, so the
/// last event received for a given id wins locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncEvent {
    /// A terminal created a new order
    NewOrder(Order),
    /// A terminal changed an order's status (still active)
    UpdateOrder(Order),
    /// A terminal completed an order
    CompleteOrder(Order),
    /// A terminal cancelled (removed) an order
    CancelOrder(OrderId),
    /// Connected-terminal count, emitted by the hub
    PeerCount(u32),
}

impl SyncEvent {
    /// Get the event type for this event
    pub fn event_type(&self) -> EventType {
        match self {
            SyncEvent::NewOrder(_) => EventType::NewOrder,
            SyncEvent::UpdateOrder(_) => EventType::UpdateOrder,
            SyncEvent::CompleteOrder(_) => EventType::CompleteOrder,
            SyncEvent::CancelOrder(_) => EventType::CancelOrder,
            SyncEvent::PeerCount(_) => EventType::PeerCount,
        }
    }

    /// The order id this event targets, if any
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            SyncEvent::NewOrder(o) | SyncEvent::UpdateOrder(o) | SyncEvent::CompleteOrder(o) => {
                Some(o.id)
            }
            SyncEvent::CancelOrder(id) => Some(*id),
            SyncEvent::PeerCount(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_roundtrip() {
        for event_type in [
            EventType::NewOrder,
            EventType::UpdateOrder,
            EventType::CompleteOrder,
            EventType::CancelOrder,
            EventType::PeerCount,
        ] {
            let byte = event_type.as_u8();
            let recovered = EventType::from_u8(byte).unwrap();
            assert_eq!(recovered, event_type);
        }
    }

    #[test]
    fn test_unknown_event_type() {
        assert!(EventType::from_u8(0xFE).is_none());
    }

    #[test]
    fn test_order_id_of_event() {
        let event = SyncEvent::CancelOrder(OrderId::new(7));
        assert_eq!(event.order_id(), Some(OrderId::new(7)));
        assert_eq!(SyncEvent::PeerCount(3).order_id(), None);
    }
}
