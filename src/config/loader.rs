//! Configuration loading from disk.

use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ProxyConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Invalid(format!(
            "listener.bind_address {:?} is not a socket address",
            config.listener.bind_address
        )));
    }
    if config.listener.max_connections == 0 {
        return Err(ConfigError::Invalid(
            "listener.max_connections must be at least 1".to_string(),
        ));
    }
    if config.timeouts.connect_secs == 0 {
        return Err(ConfigError::Invalid(
            "timeouts.connect_secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}
