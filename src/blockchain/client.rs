//! Soroban JSON-RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Speak JSON-RPC 2.0 to the configured endpoint(s)
//! - Look up account sequence numbers, simulate, send and poll transactions
//! - Handle timeouts and network errors gracefully
//! - Fail over to secondary endpoints on transport errors

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use stellar_xdr::curr::{
    LedgerEntryData, LedgerKey, LedgerKeyAccount, Limits, PublicKey, ReadXdr, TransactionEnvelope,
    Uint256, WriteXdr,
};
use tokio::time::timeout;

use crate::blockchain::types::{
    AccountId, AccountState, BlockchainError, BlockchainResult, NetworkConfig, SendResponse,
    SimulationResponse, TransactionResponse,
};
use crate::observability::metrics;

/// The ledger RPC operations the guestbook depends on.
///
/// Implemented by [`SorobanRpcClient`] for real networks and by scripted
/// doubles in tests.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Look up the account's current sequence number.
    async fn get_account(&self, account: &AccountId) -> BlockchainResult<AccountState>;

    /// Dry-run a transaction against current ledger state.
    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> BlockchainResult<SimulationResponse>;

    /// Submit a signed transaction.
    async fn send_transaction(&self, envelope: &TransactionEnvelope)
        -> BlockchainResult<SendResponse>;

    /// Query the status of a previously submitted transaction.
    async fn get_transaction(&self, hash: &str) -> BlockchainResult<TransactionResponse>;
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntriesResult {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Debug, Deserialize)]
struct LedgerEntryResult {
    xdr: String,
}

/// Why a single endpoint attempt failed.
enum Attempt {
    /// Transport failure or timeout; try the next endpoint.
    Transport(String),
    /// The node answered with an error; do not fail over.
    Fatal(BlockchainError),
}

/// Soroban RPC client with failover support.
pub struct SorobanRpcClient {
    /// Endpoint URLs (primary + failovers).
    endpoints: Vec<url::Url>,
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Request timeout duration.
    timeout_duration: Duration,
    /// Monotonic JSON-RPC request id.
    next_id: AtomicU64,
}

impl SorobanRpcClient {
    /// Create a new RPC client.
    ///
    /// # Arguments
    /// * `config` - Network configuration
    ///
    /// # Returns
    /// A new client, or an error if the primary URL is invalid
    pub fn new(config: &NetworkConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut endpoints = Vec::new();

        // 1. Add primary endpoint
        let primary: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        endpoints.push(primary);

        // 2. Add failover endpoints
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                endpoints.push(url);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let http = reqwest::Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(|e| BlockchainError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            rpc_url = %config.rpc_url,
            failovers = endpoints.len() - 1,
            "Ledger RPC client initialized"
        );

        Ok(Self {
            endpoints,
            http,
            timeout_duration,
            next_id: AtomicU64::new(1),
        })
    }

    /// Call a JSON-RPC method, failing over across endpoints on transport errors.
    async fn call<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> BlockchainResult<T> {
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match timeout(self.timeout_duration, self.call_once(endpoint, method, &params)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(Attempt::Fatal(e))) => {
                    metrics::record_rpc_failure(method);
                    return Err(e);
                }
                Ok(Err(Attempt::Transport(e))) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                }
            }
        }
        metrics::record_rpc_failure(method);
        Err(BlockchainError::Rpc(format!("All RPC providers failed for {}", method)))
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        endpoint: &url::Url,
        method: &str,
        params: &Value,
    ) -> Result<T, Attempt> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Attempt::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Attempt::Transport(format!("HTTP {}", status)));
        }

        let envelope: RpcEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(BlockchainError::Rpc(format!("Malformed response: {}", e))))?;

        if let Some(err) = envelope.error {
            return Err(Attempt::Fatal(BlockchainError::Rpc(format!(
                "{} failed ({}): {}",
                method, err.code, err.message
            ))));
        }

        envelope
            .result
            .ok_or_else(|| Attempt::Fatal(BlockchainError::Rpc(format!("{} returned no result", method))))
    }
}

#[async_trait]
impl LedgerRpc for SorobanRpcClient {
    async fn get_account(&self, account: &AccountId) -> BlockchainResult<AccountState> {
        let key = account_ledger_key(account).to_xdr_base64(Limits::none())?;
        let result: LedgerEntriesResult = self.call("getLedgerEntries", json!({ "keys": [key] })).await?;

        let entry = result
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| BlockchainError::AccountNotFound(account.to_string()))?;

        match LedgerEntryData::from_xdr_base64(&entry.xdr, Limits::none())? {
            LedgerEntryData::Account(entry) => {
                tracing::debug!(account = %account, sequence = entry.seq_num.0, "Account loaded");
                Ok(AccountState {
                    account_id: account.clone(),
                    sequence: entry.seq_num.0,
                })
            }
            _ => Err(BlockchainError::Xdr(format!(
                "Ledger entry for {} is not an account",
                account
            ))),
        }
    }

    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> BlockchainResult<SimulationResponse> {
        let transaction = envelope.to_xdr_base64(Limits::none())?;
        self.call("simulateTransaction", json!({ "transaction": transaction })).await
    }

    async fn send_transaction(&self, envelope: &TransactionEnvelope) -> BlockchainResult<SendResponse> {
        let transaction = envelope.to_xdr_base64(Limits::none())?;
        self.call("sendTransaction", json!({ "transaction": transaction })).await
    }

    async fn get_transaction(&self, hash: &str) -> BlockchainResult<TransactionResponse> {
        self.call("getTransaction", json!({ "hash": hash })).await
    }
}

impl std::fmt::Debug for SorobanRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SorobanRpcClient")
            .field("rpc_url", &self.endpoints[0].as_str())
            .field("endpoints", &self.endpoints.len())
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

fn account_ledger_key(account: &AccountId) -> LedgerKey {
    LedgerKey::Account(LedgerKeyAccount {
        account_id: stellar_xdr::curr::AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
            *account.as_bytes(),
        ))),
    })
}
