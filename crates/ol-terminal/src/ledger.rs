//! Terminal-local order ledger
//!
//! Persists the authoritative set of orders for this terminal's device
//! through the opaque key-value store. Persistence failures are logged and
//! surfaced as negative results; they never escalate as panics or crash the
//! terminal, but callers must not broadcast a mutation that did not
//! durably commit.

use thiserror::Error;

use ol_core::store::KvStore;
use ol_core::time::current_time_millis;
use ol_core::StoreError;
use ol_protocol::{Order, OrderId, OrderStatus};

/// Store key holding the serialized order list
const ORDERS_KEY: &str = "orders";

/// Store key holding the last issued order id
const LAST_ID_KEY: &str = "last-order-id";

/// Errors surfaced by ledger mutations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Mutation targeted an order id absent from the ledger
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The backing store rejected a write
    #[error("Ledger store error: {0}")]
    Store(#[from] StoreError),
}

/// The terminal's local order ledger
pub struct Ledger {
    store: Box<dyn KvStore>,
}

impl Ledger {
    /// Create a ledger over a key-value store
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    /// All known orders, in no particular order
    pub fn list(&self) -> Vec<Order> {
        match self.store.get(ORDERS_KEY) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Corrupt order list in store, starting empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read order list: {}", e);
                Vec::new()
            }
        }
    }

    /// Issue a fresh order id, strictly greater than any previously issued
    /// on this device.
    ///
    /// The counter is persisted so it survives a restart. If the store is
    /// unavailable the failure is logged and a random, non-persistent id is
    /// returned instead.
    pub fn next_id(&self) -> OrderId {
        let last = match self.store.get(LAST_ID_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<u64>(&bytes) {
                Ok(last) => last,
                Err(e) => {
                    tracing::warn!("Corrupt id counter, falling back to random id: {}", e);
                    return Self::random_id();
                }
            },
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!("Failed to read id counter, falling back to random id: {}", e);
                return Self::random_id();
            }
        };

        let next = last + 1;
        match serde_json::to_vec(&next) {
            Ok(bytes) => {
                if let Err(e) = self.store.put(LAST_ID_KEY, &bytes) {
                    tracing::warn!("Failed to persist id counter, falling back to random id: {}", e);
                    return Self::random_id();
                }
            }
            Err(e) => {
                tracing::warn!("Failed to encode id counter: {}", e);
                return Self::random_id();
            }
        }

        OrderId::new(next)
    }

    fn random_id() -> OrderId {
        OrderId::new(rand::random::<u32>() as u64)
    }

    /// Append a new order and persist the updated list
    pub fn insert(&self, order: Order) -> Result<Order, LedgerError> {
        let mut orders = self.list();
        orders.push(order.clone());
        self.persist(&orders)?;
        Ok(order)
    }

    /// Change an order's status, stamping `completed_at` on the first
    /// transition to `Completed`. Repeated completions do not re-stamp.
    pub fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, LedgerError> {
        let mut orders = self.list();
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(LedgerError::NotFound(id))?;

        order.status = status;
        if status == OrderStatus::Completed && order.completed_at.is_none() {
            order.completed_at = Some(current_time_millis());
        }
        let updated = order.clone();

        self.persist(&orders)?;
        Ok(updated)
    }

    /// Remove an order by id. Returns false if the id was absent or the
    /// updated list could not be persisted.
    pub fn remove(&self, id: OrderId) -> bool {
        let orders = self.list();
        let filtered: Vec<Order> = orders.iter().filter(|o| o.id != id).cloned().collect();
        if filtered.len() == orders.len() {
            return false;
        }
        match self.persist(&filtered) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist removal of order {}: {}", id, e);
                false
            }
        }
    }

    /// Reconcile the ledger to an externally supplied snapshot.
    ///
    /// Used when a remote event has been merged into in-memory state and
    /// the result must replace whatever was persisted before. A write
    /// failure is logged but not escalated.
    pub fn replace_all(&self, orders: &[Order]) {
        if let Err(e) = self.persist(orders) {
            tracing::warn!("Failed to persist merged order list: {}", e);
        }
    }

    /// Irreversibly wipe all orders and reset the id counter
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(ORDERS_KEY) {
            tracing::warn!("Failed to clear order list: {}", e);
        }
        if let Err(e) = self.store.remove(LAST_ID_KEY) {
            tracing::warn!("Failed to reset id counter: {}", e);
        }
    }

    fn persist(&self, orders: &[Order]) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(orders).map_err(StoreError::Serialization)?;
        self.store.put(ORDERS_KEY, &bytes)?;
        Ok(())
    }
}
