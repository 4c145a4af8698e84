//! Relay hub configuration

use serde::{Deserialize, Serialize};

/// Configuration for the relay hub daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Address to bind the TCP listener to
    pub bind_address: String,

    /// Maximum number of concurrent terminal connections
    pub max_connections: Option<u32>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            max_connections: None,
        }
    }
}
