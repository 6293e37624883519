//! Ledger-specific types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use crate::config::schema::NetworkConfig;

/// Ledger account identifier (`G...` strkey) for strong typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountId(stellar_strkey::ed25519::PublicKey);

impl AccountId {
    /// Parse and checksum-verify a `G...` account strkey.
    pub fn parse(s: &str) -> BlockchainResult<Self> {
        stellar_strkey::ed25519::PublicKey::from_string(s)
            .map(Self)
            .map_err(|e| BlockchainError::InvalidAddress(format!("'{}': {}", s, e)))
    }

    /// Build from raw ed25519 public key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(stellar_strkey::ed25519::PublicKey(bytes))
    }

    /// Raw ed25519 public key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string())
    }
}

/// Contract identifier (`C...` strkey).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractId(stellar_strkey::Contract);

impl ContractId {
    /// Parse and checksum-verify a `C...` contract strkey.
    pub fn parse(s: &str) -> BlockchainResult<Self> {
        stellar_strkey::Contract::from_string(s)
            .map(Self)
            .map_err(|e| BlockchainError::InvalidAddress(format!("'{}': {}", s, e)))
    }

    /// Build from the raw 32-byte contract hash.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(stellar_strkey::Contract(bytes))
    }

    /// Raw 32-byte contract hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string())
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The account does not exist on the ledger.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Wire encoding or decoding failed.
    #[error("XDR error: {0}")]
    Xdr(String),

    /// Malformed account or contract identifier.
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    /// Transaction did not settle within the confirmation deadline.
    #[error("Transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// Confirmation wait was cancelled by the caller.
    #[error("Confirmation wait cancelled")]
    Cancelled,
}

impl From<stellar_xdr::curr::Error> for BlockchainError {
    fn from(e: stellar_xdr::curr::Error) -> Self {
        BlockchainError::Xdr(e.to_string())
    }
}

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Current on-ledger state of an account needed to sequence a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    /// The account.
    pub account_id: AccountId,
    /// Current sequence number; the next transaction uses `sequence + 1`.
    pub sequence: i64,
}

/// Result of `simulateTransaction`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationResponse {
    /// Present when the simulation failed.
    pub error: Option<String>,
    /// Base64 `SorobanTransactionData` footprint.
    pub transaction_data: Option<String>,
    /// Minimum resource fee in stroops (string-encoded by the RPC).
    pub min_resource_fee: Option<String>,
    /// Per-operation results.
    pub results: Vec<SimulationResult>,
    /// Ledger the simulation ran against.
    pub latest_ledger: u32,
}

impl SimulationResponse {
    /// Base64 return value of the first (only) host function, if any.
    pub fn return_value(&self) -> Option<&str> {
        self.results
            .first()
            .map(|r| r.xdr.as_str())
            .filter(|xdr| !xdr.is_empty())
    }
}

/// Per-operation simulation result.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationResult {
    /// Base64 `SorobanAuthorizationEntry` values required by the invocation.
    pub auth: Vec<String>,
    /// Base64 `ScVal` return value.
    pub xdr: String,
}

/// Immediate status returned by `sendTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
    #[serde(other)]
    Unknown,
}

/// Result of `sendTransaction`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub status: SendStatus,
    pub hash: String,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
}

/// Settled (or not yet visible) status returned by `getTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    NotFound,
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::NotFound => "NOT_FOUND",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Result of `getTransaction`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub status: TransactionStatus,
    #[serde(default)]
    pub ledger: Option<u32>,
}
