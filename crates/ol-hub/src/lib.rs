//! ol-hub: OrderLink relay hub
//!
//! The hub is the rendezvous point every terminal connects to. It keeps no
//! order data and interprets no payloads: each inbound event is rebroadcast
//! verbatim to every other connected terminal, and the connected-terminal
//! count is pushed to everyone on connect and disconnect.

pub mod registry;
pub mod server;

pub use registry::{PeerId, PeerRegistry};
pub use server::HubServer;
