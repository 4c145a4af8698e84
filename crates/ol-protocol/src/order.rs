//! Shared order data model
//!
//! Orders are the central entity replicated between terminals. Every sync
//! event carries a full `Order` snapshot, never a field-level diff, so the
//! receiving side can always overwrite by id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order.
///
/// Ids are assigned monotonically by the terminal that creates the order;
/// that terminal is the originating authority for the order, every other
/// terminal only ever holds a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Create a new order ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Forward-only order lifecycle state.
///
/// The mechanism itself does not enforce monotonicity; a remote snapshot is
/// always applied as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    New,
    InProgress,
    Completed,
}

impl OrderStatus {
    /// Whether this status is terminal
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// One line of an order: a menu item with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Catalog id of the menu item
    pub menu_item_id: String,
    /// Display name, captured at order time
    pub name: String,
    /// Number of units ordered (> 0)
    pub quantity: u32,
    /// Price per unit in minor currency units (>= 0)
    pub unit_price: u64,
}

impl OrderLineItem {
    /// Create a new line item
    pub fn new(
        menu_item_id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: u64,
    ) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// Total for this line
    pub fn line_total(&self) -> u64 {
        u64::from(self.quantity) * self.unit_price
    }
}

/// A customer order.
///
/// `total_price` is computed once at creation and stored; it is never
/// recomputed on read. `created_at` is immutable after creation and
/// `completed_at` is stamped at most once, on the first transition to
/// `Completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique id, assigned by the originating terminal
    pub id: OrderId,
    /// Line items in insertion order
    pub items: Vec<OrderLineItem>,
    /// Current lifecycle state
    pub status: OrderStatus,
    /// Creation time, unix milliseconds
    pub created_at: u64,
    /// Completion time, unix milliseconds, set once
    #[serde(default)]
    pub completed_at: Option<u64>,
    /// Sum of line totals, fixed at creation
    pub total_price: u64,
}

impl Order {
    /// Create a new order in the `New` state, computing the stored total
    pub fn new(id: OrderId, items: Vec<OrderLineItem>, created_at: u64) -> Self {
        let total_price = items.iter().map(OrderLineItem::line_total).sum();
        Self {
            id,
            items,
            status: OrderStatus::New,
            created_at,
            completed_at: None,
            total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_computed_at_creation() {
        let order = Order::new(
            OrderId::new(1),
            vec![
                OrderLineItem::new("yakisoba", "Yakisoba", 2, 140),
                OrderLineItem::new("ramune", "Ramune", 1, 120),
            ],
            1_700_000_000_000,
        );
        assert_eq!(order.total_price, 400);
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.completed_at.is_none());
    }

    #[test]
    fn test_status_serde_vocabulary() {
        let json = serde_json::to_string(&OrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, OrderStatus::Completed);
    }

    #[test]
    fn test_order_id_display() {
        assert_eq!(OrderId::new(42).to_string(), "42");
    }
}
