//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BalancerConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("unable to read configuration: {0}")]
    Io(#[source] std::io::Error),

    /// The file is not valid TOML for the schema.
    #[error("unable to parse configuration: {0}")]
    Parse(#[source] toml::de::Error),

    /// The configuration parsed but is semantically unusable.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BalancerConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config)?;

    Ok(config)
}

/// Semantic checks beyond what the schema can express.
fn validate_config(config: &BalancerConfig) -> Result<(), ConfigError> {
    if config.host_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "host_timeout_secs must be > 0".to_string(),
        ));
    }

    Ok(())
}
