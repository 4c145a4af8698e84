//! Terminal sync agent
//!
//! Bridges the local ledger and the hub link. Local mutations follow a
//! two-phase sequence: commit to the ledger first, apply to the in-memory
//! views, then broadcast. A mutation that fails to commit never produces
//! an event. Inbound events are applied last-write-wins by order id, with
//! the full merged state written back through `replace_all`.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ol_core::time::current_time_millis;
use ol_protocol::{Order, OrderId, OrderLineItem, OrderStatus, SyncEvent};

use crate::bus::{BusEvent, EventBus};
use crate::ledger::{Ledger, LedgerError};
use crate::link::{ActiveLink, LinkEvent};

/// Outbound seam between the agent and the transport.
///
/// Emission is fire-and-forget: by the time an event is emitted the
/// mutation has already durably committed locally, and local state is
/// authoritative for this terminal. A failed emission (offline mode) is a
/// logged no-op; divergence is only ever corrected by the next delivered
/// remote event for that id.
pub trait EventSink: Send + Sync {
    /// Emit an event toward the hub
    fn emit(&self, event: SyncEvent);
}

impl EventSink for mpsc::Sender<SyncEvent> {
    fn emit(&self, event: SyncEvent) {
        if let Err(e) = self.try_send(event) {
            tracing::debug!("Event not broadcast (offline or backlogged): {}", e);
        }
    }
}

/// The three derived views exposed to the UI
#[derive(Default)]
struct Views {
    /// Orders with status != completed
    active: Vec<Order>,
    /// Completed orders, most recent first
    completed: Vec<Order>,
    /// Full ledger contents, authoritative for persistence reconciliation
    all: Vec<Order>,
}

impl Views {
    fn load(orders: Vec<Order>) -> Self {
        let active = orders
            .iter()
            .filter(|o| !o.status.is_completed())
            .cloned()
            .collect();
        let mut completed: Vec<Order> = orders
            .iter()
            .filter(|o| o.status.is_completed())
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Self {
            active,
            completed,
            all: orders,
        }
    }

    fn contains(&self, id: OrderId) -> bool {
        self.all.iter().any(|o| o.id == id)
    }

    /// Append a previously unknown order; a known id is ignored
    fn apply_new(&mut self, order: Order) {
        if self.contains(order.id) {
            return;
        }
        self.active.push(order.clone());
        self.all.push(order);
    }

    /// Overwrite the entry for this id with a full snapshot, moving it
    /// between the active and completed views as its status dictates. A
    /// snapshot for an unknown id is a no-op: update events replace
    /// existing entries, `NewOrder` is the sole append path, so the derived
    /// views always remain subsets of `all`.
    fn apply_snapshot(&mut self, order: Order) {
        let Some(slot) = self.all.iter_mut().find(|o| o.id == order.id) else {
            return;
        };
        *slot = order.clone();
        self.active.retain(|o| o.id != order.id);
        self.completed.retain(|o| o.id != order.id);
        if order.status.is_completed() {
            self.completed.insert(0, order);
        } else {
            self.active.push(order);
        }
    }

    /// Remove an order from the active and authoritative views
    fn apply_cancel(&mut self, id: OrderId) {
        self.active.retain(|o| o.id != id);
        self.all.retain(|o| o.id != id);
    }
}

/// Per-terminal sync agent
pub struct SyncAgent {
    ledger: Ledger,
    views: Mutex<Views>,
    sink: Box<dyn EventSink>,
    bus: Arc<EventBus>,
}

impl SyncAgent {
    /// Create an agent over a ledger, seeding the views from persisted
    /// state
    pub fn new(ledger: Ledger, sink: Box<dyn EventSink>, bus: Arc<EventBus>) -> Self {
        let views = Views::load(ledger.list());
        Self {
            ledger,
            views: Mutex::new(views),
            sink,
            bus,
        }
    }

    /// Orders not yet completed
    pub fn active_orders(&self) -> Vec<Order> {
        self.views.lock().expect("views mutex poisoned").active.clone()
    }

    /// Completed orders, most recent first
    pub fn completed_orders(&self) -> Vec<Order> {
        self.views
            .lock()
            .expect("views mutex poisoned")
            .completed
            .clone()
    }

    /// The full merged ledger
    pub fn all_orders(&self) -> Vec<Order> {
        self.views.lock().expect("views mutex poisoned").all.clone()
    }

    /// Every order regardless of status, newest first
    pub fn order_history(&self) -> Vec<Order> {
        let mut orders = self.all_orders();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Create a new order from the register flow.
    ///
    /// Commits to the ledger, applies optimistically to the in-memory
    /// views, then broadcasts `NewOrder`. A failed ledger write means no
    /// event and an error result.
    pub fn create_order(&self, items: Vec<OrderLineItem>) -> Result<Order, LedgerError> {
        let id = self.ledger.next_id();
        let order = Order::new(id, items, current_time_millis());
        let order = self.ledger.insert(order)?;

        self.views
            .lock()
            .expect("views mutex poisoned")
            .apply_new(order.clone());

        self.emit_and_publish(SyncEvent::NewOrder(order.clone()));
        Ok(order)
    }

    /// Change an order's status.
    ///
    /// The order must already be present in the in-memory state (guards
    /// against acting on stale UI). Emits `CompleteOrder` or `UpdateOrder`
    /// per the target status; on failure no event is emitted.
    pub fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, LedgerError> {
        if !self.views.lock().expect("views mutex poisoned").contains(id) {
            return Err(LedgerError::NotFound(id));
        }

        let updated = self.ledger.set_status(id, status)?;

        self.views
            .lock()
            .expect("views mutex poisoned")
            .apply_snapshot(updated.clone());

        let event = if updated.status.is_completed() {
            SyncEvent::CompleteOrder(updated.clone())
        } else {
            SyncEvent::UpdateOrder(updated.clone())
        };
        self.emit_and_publish(event);
        Ok(updated)
    }

    /// Cancel (remove) an order
    pub fn cancel_order(&self, id: OrderId) -> Result<(), LedgerError> {
        if !self.views.lock().expect("views mutex poisoned").contains(id) {
            return Err(LedgerError::NotFound(id));
        }

        if !self.ledger.remove(id) {
            return Err(LedgerError::NotFound(id));
        }

        self.views
            .lock()
            .expect("views mutex poisoned")
            .apply_cancel(id);

        self.emit_and_publish(SyncEvent::CancelOrder(id));
        Ok(())
    }

    /// Irreversibly wipe the local ledger and views. Local-only; no event
    /// is broadcast.
    pub fn clear_history(&self) {
        self.ledger.clear();
        *self.views.lock().expect("views mutex poisoned") = Views::default();
    }

    /// Apply an event received from another terminal.
    ///
    /// Idempotent, keyed strictly by id; payload fields are trusted as the
    /// new truth, so the last event received for an id wins locally. The
    /// merged state is persisted after every application.
    pub fn apply_remote(&self, event: SyncEvent) {
        match &event {
            SyncEvent::NewOrder(order) => {
                let mut views = self.views.lock().expect("views mutex poisoned");
                views.apply_new(order.clone());
                self.ledger.replace_all(&views.all);
            }
            SyncEvent::UpdateOrder(order) | SyncEvent::CompleteOrder(order) => {
                let mut views = self.views.lock().expect("views mutex poisoned");
                views.apply_snapshot(order.clone());
                self.ledger.replace_all(&views.all);
            }
            SyncEvent::CancelOrder(id) => {
                let mut views = self.views.lock().expect("views mutex poisoned");
                views.apply_cancel(*id);
                self.ledger.replace_all(&views.all);
            }
            SyncEvent::PeerCount(_) => {}
        }
        self.bus.publish(&BusEvent::Sync(event));
    }

    /// Drive inbound link events into the agent until the link closes or
    /// shutdown is requested
    pub async fn run(self: Arc<Self>, mut link: ActiveLink, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = link.recv_event() => {
                    match event {
                        Some(LinkEvent::Event(event)) => {
                            tracing::debug!("Applying remote {:?}", event.event_type());
                            self.apply_remote(event);
                        }
                        Some(LinkEvent::Disconnected) => {
                            tracing::warn!("Hub link lost; continuing in offline mode");
                        }
                        None => break,
                    }
                }
            }
        }
    }

    fn emit_and_publish(&self, event: SyncEvent) {
        self.sink.emit(event.clone());
        self.bus.publish(&BusEvent::Sync(event));
    }
}
