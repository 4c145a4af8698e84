//! Core error types for OrderLink

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the local key-value persistence layer.
///
/// Persistence failures are never fatal to a terminal; callers log them and
/// surface the affected operation as a negative result.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error while reading or writing the backing medium
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes could not be serialized or deserialized
    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backing medium unavailable (e.g. data dir missing and uncreatable)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
