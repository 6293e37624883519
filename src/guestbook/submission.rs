//! Write path: validate, build, simulate, sign, send and confirm a message.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::blockchain::transaction::{address_arg, decode_envelope, encode_envelope, string_arg};
use crate::blockchain::types::{SendStatus, TransactionStatus};
use crate::blockchain::{
    AccountId, BlockchainError, LedgerRpc, SignOptions, TxBuilder, WalletError, WalletProvider,
};
use crate::config::SubmissionConfig;
use crate::observability::metrics;

/// Contract function appending one message.
pub const WRITE_FUNCTION: &str = "add_message";

/// Shortest accepted message, in characters.
pub const MIN_MESSAGE_CHARS: usize = 3;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 140;

/// A message outside the accepted length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MessageLengthError {
    #[error("Your message must be at least 3 characters long.")]
    TooShort,

    #[error("Your message can be at most 140 characters long.")]
    TooLong,
}

/// Check a message against the length bounds, counting Unicode scalar values.
pub fn validate_message(message: &str) -> Result<(), MessageLengthError> {
    let len = message.chars().count();
    if len < MIN_MESSAGE_CHARS {
        Err(MessageLengthError::TooShort)
    } else if len > MAX_MESSAGE_CHARS {
        Err(MessageLengthError::TooLong)
    } else {
        Ok(())
    }
}

/// Errors that end a submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    InvalidMessage(#[from] MessageLengthError),

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Wallet not allowed for this application")]
    WalletNotAllowed,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Ledger(BlockchainError),

    #[error("Simulation failed: {0}")]
    Simulation(String),

    #[error("Transaction rejected: {0}")]
    Rejected(String),

    #[error("Transaction failed: {0}")]
    ConfirmationFailed(TransactionStatus),

    #[error("Transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    #[error("Submission cancelled")]
    Cancelled,
}

impl SubmitError {
    /// Outcome label for the submissions counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            SubmitError::InvalidMessage(_) => "invalid_message",
            SubmitError::WalletNotConnected | SubmitError::WalletNotAllowed => "wallet_unavailable",
            SubmitError::Wallet(_) => "wallet_error",
            SubmitError::Ledger(_) => "ledger_error",
            SubmitError::Simulation(_) => "simulation_failed",
            SubmitError::Rejected(_) => "rejected",
            SubmitError::ConfirmationFailed(_) => "failed",
            SubmitError::ConfirmationTimeout(_) => "timeout",
            SubmitError::Cancelled => "cancelled",
        }
    }
}

impl From<BlockchainError> for SubmitError {
    fn from(e: BlockchainError) -> Self {
        match e {
            BlockchainError::ConfirmationTimeout(secs) => SubmitError::ConfirmationTimeout(secs),
            BlockchainError::Cancelled => SubmitError::Cancelled,
            other => SubmitError::Ledger(other),
        }
    }
}

/// Runs the full write path against the injected wallet and ledger.
///
/// The workflow never touches the displayed entry list; callers re-fetch
/// after a successful submission.
pub struct SubmissionWorkflow {
    rpc: Arc<dyn LedgerRpc>,
    wallet: Arc<dyn WalletProvider>,
    builder: TxBuilder,
    config: SubmissionConfig,
}

impl SubmissionWorkflow {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        wallet: Arc<dyn WalletProvider>,
        builder: TxBuilder,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            rpc,
            wallet,
            builder,
            config,
        }
    }

    /// Submit a message. Resolves `true` once the ledger accepted it.
    pub async fn submit(&self, message: &str) -> Result<bool, SubmitError> {
        self.submit_with_cancel(message, &CancellationToken::new()).await
    }

    /// Submit a message; cancelling `cancel` aborts the confirmation wait.
    pub async fn submit_with_cancel(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, SubmitError> {
        let result = self.run(message, cancel).await;
        match &result {
            Ok(_) => metrics::record_submission("success"),
            Err(e) => {
                tracing::warn!(error = %e, "Submission failed");
                metrics::record_submission(e.outcome());
            }
        }
        result
    }

    async fn run(&self, message: &str, cancel: &CancellationToken) -> Result<bool, SubmitError> {
        validate_message(message)?;

        // Fail fast before any ledger traffic
        if !self.wallet.is_connected().await.unwrap_or(false) {
            return Err(SubmitError::WalletNotConnected);
        }
        if !self.wallet.is_allowed().await.unwrap_or(false) {
            return Err(SubmitError::WalletNotAllowed);
        }

        let public_key = self.wallet.get_public_key().await?;
        let account = AccountId::parse(&public_key)?;
        let source = self.rpc.get_account(&account).await?;
        tracing::debug!(account = %account, sequence = source.sequence, "Loaded source account");

        let envelope = self.builder.invoke(
            &source,
            WRITE_FUNCTION,
            vec![address_arg(&account), string_arg(message)?],
        )?;

        let simulation = self.rpc.simulate_transaction(&envelope).await?;
        if let Some(error) = simulation.error.as_deref() {
            return Err(SubmitError::Simulation(error.to_string()));
        }

        let assembled = self.builder.assemble(&envelope, &simulation)?;
        let opts = SignOptions {
            network_passphrase: self.builder.network_passphrase().to_string(),
            account_to_sign: public_key,
        };
        let signed_xdr = self
            .wallet
            .sign_transaction(&encode_envelope(&assembled)?, &opts)
            .await?;
        let signed = decode_envelope(&signed_xdr)?;

        let sent = self.rpc.send_transaction(&signed).await?;
        tracing::info!(hash = %sent.hash, status = ?sent.status, "Transaction submitted");

        match sent.status {
            SendStatus::Error => Err(SubmitError::Rejected(
                sent.error_result_xdr
                    .unwrap_or_else(|| "no error result".to_string()),
            )),
            SendStatus::Pending => {
                let response = self
                    .builder
                    .wait_for_confirmation(
                        self.rpc.as_ref(),
                        &sent.hash,
                        Duration::from_millis(self.config.poll_interval_ms),
                        Duration::from_secs(self.config.confirmation_timeout_secs),
                        cancel,
                    )
                    .await?;

                match response.status {
                    TransactionStatus::Success => {
                        tracing::info!(hash = %sent.hash, ledger = ?response.ledger, "Transaction confirmed");
                        Ok(true)
                    }
                    other => Err(SubmitError::ConfirmationFailed(other)),
                }
            }
            other => {
                tracing::info!(hash = %sent.hash, status = ?other, "Transaction accepted without confirmation");
                Ok(true)
            }
        }
    }
}
