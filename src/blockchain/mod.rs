//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (wallet secret, RPC URL override)
//!     → wallet.rs (key loading, access, signing)
//!     → client.rs (JSON-RPC with timeouts and failover)
//!     → transaction.rs (build, assemble, confirm)
//! ```
//!
//! # Security Constraints
//! - Secret seeds ONLY from environment variables
//! - Never log secrets or signed envelopes
//! - All RPC calls have configurable timeouts
//! - Confirmation waits are bounded and cancellable

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{LedgerRpc, SorobanRpcClient};
pub use transaction::TxBuilder;
pub use types::{AccountId, AccountState, BlockchainError, BlockchainResult, ContractId};
pub use wallet::{LocalKeypairWallet, SignOptions, WalletError, WalletProvider};
