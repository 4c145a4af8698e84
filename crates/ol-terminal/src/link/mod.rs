//! Hub link: connection establishment and liveness state
//!
//! One link per terminal process, explicitly constructed at startup and
//! torn down on shutdown. The connector dials the hub over TCP with a
//! bounded, fixed-delay retry budget; the resulting active link carries
//! framed sync events in both directions.

mod connector;
mod retry;
mod status;

pub use connector::{ActiveLink, ConnectError, HubConnector, LinkEvent};
pub use retry::RetryPolicy;
pub use status::{ConnectionSnapshot, LinkStatus};
