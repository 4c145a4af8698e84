//! ol-terminal: OrderLink terminal sync agent
//!
//! Each terminal (register, kitchen display, public display) runs one of
//! these. The agent owns the terminal's local order ledger, keeps a link to
//! the relay hub, translates local mutations into outbound events, and
//! merges inbound events from other terminals into the ledger. Local state
//! is always authoritative for the terminal's own mutations; replicas are
//! corrected only by received events.

pub mod bus;
pub mod ledger;
pub mod link;
pub mod monitor;
pub mod sync;

pub use bus::{BusEvent, EventBus, EventKind, Subscription};
pub use ledger::{Ledger, LedgerError};
pub use link::{ActiveLink, ConnectError, ConnectionSnapshot, HubConnector, LinkStatus, RetryPolicy};
pub use monitor::ConnectionMonitor;
pub use sync::{EventSink, SyncAgent};
