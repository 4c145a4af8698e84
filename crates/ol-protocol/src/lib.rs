//! ol-protocol: Wire protocol for OrderLink terminal synchronization
//!
//! This crate defines the binary protocol used for communication between
//! the relay hub and the terminals, plus the shared order data model that
//! rides inside it.

pub mod codec;
pub mod error;
pub mod event;
pub mod frame;
pub mod order;

pub use codec::EventCodec;
pub use error::ProtocolError;
pub use event::{EventType, SyncEvent};
pub use frame::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use order::{Order, OrderId, OrderLineItem, OrderStatus};
