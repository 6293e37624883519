//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guestbook
//! client. All types derive Serde traits for deserialization from config files,
//! and every field has a default pointing at the public Stellar testnet.

use serde::{Deserialize, Serialize};

/// Root configuration for the guestbook client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuestbookConfig {
    /// Ledger network and contract settings.
    pub network: NetworkConfig,

    /// Read-path settings (reader identity, sample data).
    pub reader: ReaderConfig,

    /// Write-path settings (fees, validity window, confirmation polling).
    pub submission: SubmissionConfig,

    /// Local wallet settings.
    pub wallet: WalletConfig,

    /// Local bookkeeping storage.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Soroban JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Network passphrase used for signing and network identification.
    pub network_passphrase: String,

    /// Guestbook contract identifier (56-character `C...` strkey).
    pub contract_id: String,

    /// Block explorer base URL.
    pub explorer_url: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://soroban-testnet.stellar.org".to_string(),
            failover_urls: Vec::new(),
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            contract_id: "CD5HAABXEFWUTSQKYZI37SQBWU4BPRQL7Y6DWTB5SZLHNG52VIDJFYYM".to_string(),
            explorer_url: "https://stellar.expert/explorer/testnet".to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Read-path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Funded account used as simulation source when no wallet is connected.
    pub fallback_account: String,

    /// Show the illustrative sample entries when the ledger read fails.
    /// When disabled, a failed read yields an empty list.
    pub show_sample_data: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fallback_account: "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR"
                .to_string(),
            show_sample_data: true,
        }
    }
}

/// Write-path configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Base inclusion fee in stroops (resource fee is added after simulation).
    pub base_fee: u32,

    /// Transaction validity window in seconds from build time.
    pub tx_timeout_secs: u64,

    /// Delay between confirmation checks in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound on the whole confirmation wait in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            base_fee: 100_000, // 0.01 XLM
            tx_timeout_secs: 30,
            poll_interval_ms: 1000,
            confirmation_timeout_secs: 120,
        }
    }
}

/// Local wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Name of the environment variable holding the `S...` secret seed.
    pub secret_env: String,

    /// Treat the application as already allowed (no access prompt needed).
    pub auto_allow: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            secret_env: "GUESTBOOK_WALLET_SECRET".to_string(),
            auto_allow: false,
        }
    }
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the local message bookkeeping file.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ".guestbook".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}
