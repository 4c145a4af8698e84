//! ol-core: Shared foundation for OrderLink
//!
//! Configuration loading, the key-value persistence interface used by the
//! terminal-local order ledger, time utilities, and the shared error
//! taxonomy.

pub mod config;
pub mod error;
pub mod store;
pub mod time;

pub use error::{ConfigError, StoreError};
pub use store::{FileStore, KvStore, MemoryStore};
