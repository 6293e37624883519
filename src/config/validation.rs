//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and ledger identifiers
//! - Validate value ranges (timeouts > 0, fees > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuestbookConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::blockchain::types::{AccountId, ContractId};
use crate::config::schema::GuestbookConfig;

/// Longest transaction validity window accepted, in seconds.
pub const MAX_TX_TIMEOUT_SECS: u64 = 86_400;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GuestbookConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.network.rpc_url) {
        errors.push(ValidationError::new("network.rpc_url", format!("invalid URL: {}", e)));
    }
    for (i, failover) in config.network.failover_urls.iter().enumerate() {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(
                &format!("network.failover_urls[{}]", i),
                format!("invalid URL: {}", e),
            ));
        }
    }
    if config.network.network_passphrase.trim().is_empty() {
        errors.push(ValidationError::new("network.network_passphrase", "must not be empty"));
    }
    if let Err(e) = ContractId::parse(&config.network.contract_id) {
        errors.push(ValidationError::new("network.contract_id", e.to_string()));
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be greater than 0"));
    }

    if let Err(e) = AccountId::parse(&config.reader.fallback_account) {
        errors.push(ValidationError::new("reader.fallback_account", e.to_string()));
    }

    let submission = &config.submission;
    if submission.base_fee == 0 {
        errors.push(ValidationError::new("submission.base_fee", "must be greater than 0"));
    }
    if submission.tx_timeout_secs == 0 || submission.tx_timeout_secs > MAX_TX_TIMEOUT_SECS {
        errors.push(ValidationError::new(
            "submission.tx_timeout_secs",
            format!("must be between 1 and {}", MAX_TX_TIMEOUT_SECS),
        ));
    }
    if submission.poll_interval_ms == 0 {
        errors.push(ValidationError::new("submission.poll_interval_ms", "must be greater than 0"));
    }
    if submission.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "submission.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected 'pretty' or 'json'", other),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GuestbookConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GuestbookConfig::default();
        config.network.rpc_url = "not a url".to_string();
        config.network.contract_id = "CSHORT".to_string();
        config.reader.fallback_account = "GNOPE".to_string();
        config.submission.poll_interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "network.rpc_url",
                "network.contract_id",
                "reader.fallback_account",
                "submission.poll_interval_ms",
            ]
        );
    }

    #[test]
    fn test_tx_timeout_is_bounded() {
        let mut config = GuestbookConfig::default();
        config.submission.tx_timeout_secs = MAX_TX_TIMEOUT_SECS;
        assert!(validate_config(&config).is_ok());

        config.submission.tx_timeout_secs = u64::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "submission.tx_timeout_secs");
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let mut config = GuestbookConfig::default();
        config.observability.log_format = "xml".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("xml"));
    }
}
