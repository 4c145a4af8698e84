//! Configuration management for OrderLink

mod hub;
mod serde_utils;
mod terminal;

pub use hub::HubConfig;
pub use terminal::{RetryConfig, TerminalConfig};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orderlink")
}

/// Get the default data directory for a terminal's local ledger
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("orderlink")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::Invalid(format!("Failed to write config: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terminal.toml");

        let config = TerminalConfig::default();
        save_config(&path, &config).unwrap();

        let loaded: TerminalConfig = load_config(&path).unwrap();
        assert_eq!(loaded.hub_address, config.hub_address);
        assert_eq!(loaded.retry.max_attempts, config.retry.max_attempts);
    }

    #[test]
    fn test_load_missing_config() {
        let result: Result<TerminalConfig, _> = load_config(Path::new("/nonexistent/terminal.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
