//! Terminal configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::{duration_millis, duration_secs};

/// Configuration for a terminal process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Hub address to connect to (host:port on the local network)
    pub hub_address: String,

    /// Terminal name for logging (defaults to hostname)
    pub terminal_name: Option<String>,

    /// Directory holding the terminal's local order ledger
    pub data_dir: PathBuf,

    /// Connection timeout
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Retry policy for (re)connecting to the hub
    pub retry: RetryConfig,

    /// How often the connection monitor samples link liveness
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            hub_address: "localhost:3001".to_string(),
            terminal_name: None,
            data_dir: super::default_data_dir(),
            connect_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl TerminalConfig {
    /// Get the terminal name, falling back to hostname
    pub fn terminal_name(&self) -> String {
        self.terminal_name
            .clone()
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().into_owned())
    }
}

/// Bounded, fixed-delay retry configuration.
///
/// Reconnection is deliberately not an unbounded loop: once the attempt
/// budget is exhausted the terminal stays in offline mode and surfaces a
/// persistent disconnected status to its operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of connection attempts
    pub max_attempts: u32,

    /// Fixed delay between attempts
    #[serde(with = "duration_millis")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1000),
        }
    }
}
