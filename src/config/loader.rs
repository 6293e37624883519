//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GuestbookConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `network.rpc_url`.
pub const RPC_URL_ENV_VAR: &str = "GUESTBOOK_RPC_URL";

/// Environment variable overriding `network.contract_id`.
pub const CONTRACT_ID_ENV_VAR: &str = "GUESTBOOK_CONTRACT_ID";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GuestbookConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text, applying env overrides.
pub fn parse_config(content: &str) -> Result<GuestbookConfig, ConfigError> {
    let mut config: GuestbookConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the built-in defaults with env overrides, validated.
pub fn default_config() -> Result<GuestbookConfig, ConfigError> {
    let mut config = GuestbookConfig::default();
    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut GuestbookConfig) {
    if let Ok(url) = std::env::var(RPC_URL_ENV_VAR) {
        tracing::debug!(rpc_url = %url, "RPC URL overridden from environment");
        config.network.rpc_url = url;
    }
    if let Ok(contract) = std::env::var(CONTRACT_ID_ENV_VAR) {
        tracing::debug!(contract_id = %contract, "Contract ID overridden from environment");
        config.network.contract_id = contract;
    }
}
