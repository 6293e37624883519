//! Wallet providers and transaction signing.
//!
//! # Security
//! - Secret seeds are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//! - A wallet only signs for its own account

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::sync::atomic::{AtomicBool, Ordering};
use stellar_xdr::curr::{BytesM, DecoratedSignature, Signature, SignatureHint, TransactionEnvelope};
use thiserror::Error;

use crate::blockchain::transaction::{decode_envelope, encode_envelope, transaction_hash};
use crate::blockchain::types::AccountId;
use crate::config::WalletConfig;

/// Errors surfaced by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No wallet is installed or initialized.
    #[error("Wallet not installed")]
    NotInstalled,

    /// The user declined the access prompt.
    #[error("Wallet access denied")]
    AccessDenied,

    /// No public key is available.
    #[error("No account available in wallet")]
    NoAccount,

    /// The user declined to sign.
    #[error("Signing rejected by user")]
    SigningRejected,

    /// Any other wallet-side signing fault.
    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Signing scope passed along with an unsigned envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    /// Network the signature is valid for.
    pub network_passphrase: String,
    /// Account expected to sign.
    pub account_to_sign: String,
}

/// A wallet holding the user's keypair.
///
/// Mirrors the operations a browser wallet extension exposes. Implementations
/// hold no application state beyond what the wallet itself owns.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether the wallet is present and initialized.
    async fn is_connected(&self) -> Result<bool, WalletError>;

    /// Whether this application may read the account without prompting.
    async fn is_allowed(&self) -> Result<bool, WalletError>;

    /// Prompt for access to the account.
    async fn request_access(&self) -> Result<(), WalletError>;

    /// The account's public key (`G...`).
    async fn get_public_key(&self) -> Result<String, WalletError>;

    /// Sign a base64 transaction envelope, returning the signed envelope.
    async fn sign_transaction(&self, xdr: &str, opts: &SignOptions) -> Result<String, WalletError>;
}

/// Wallet backed by an ed25519 keypair held in process memory.
///
/// Without a key it behaves like a wallet that is not installed.
pub struct LocalKeypairWallet {
    /// The signing key, if one was loaded.
    key: Option<SigningKey>,
    /// Whether access has been granted to this application.
    allowed: AtomicBool,
}

impl LocalKeypairWallet {
    /// Create a wallet from an `S...` secret seed.
    ///
    /// # Security
    /// The seed is parsed and kept in memory only. It is never logged.
    pub fn from_secret(secret: &str, allowed: bool) -> Result<Self, WalletError> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret.trim())
            .map_err(|e| WalletError::Signing(format!("Invalid secret seed: {}", e)))?;
        let key = SigningKey::from_bytes(&seed.0);

        tracing::info!(
            account = %AccountId::from_bytes(key.verifying_key().to_bytes()),
            "Wallet initialized"
        );

        Ok(Self {
            key: Some(key),
            allowed: AtomicBool::new(allowed),
        })
    }

    /// A wallet with no key, reporting itself as not connected.
    pub fn disconnected() -> Self {
        Self {
            key: None,
            allowed: AtomicBool::new(false),
        }
    }

    /// Load the wallet from the environment variable named in `config`.
    ///
    /// A missing variable yields a disconnected wallet; a malformed seed is an error.
    pub fn from_env(config: &WalletConfig) -> Result<Self, WalletError> {
        match std::env::var(&config.secret_env) {
            Ok(secret) => Self::from_secret(&secret, config.auto_allow),
            Err(_) => {
                tracing::debug!(env = %config.secret_env, "No wallet secret in environment");
                Ok(Self::disconnected())
            }
        }
    }

    fn account(&self) -> Option<AccountId> {
        self.key
            .as_ref()
            .map(|key| AccountId::from_bytes(key.verifying_key().to_bytes()))
    }

    fn sign_envelope(
        &self,
        key: &SigningKey,
        envelope: TransactionEnvelope,
        network_passphrase: &str,
    ) -> Result<TransactionEnvelope, WalletError> {
        let TransactionEnvelope::Tx(mut v1) = envelope else {
            return Err(WalletError::Signing("unsupported envelope type".to_string()));
        };

        let hash = transaction_hash(&v1.tx, network_passphrase)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        let signature = key.sign(&hash);

        let public = key.verifying_key().to_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public[28..]);

        let decorated = DecoratedSignature {
            hint: SignatureHint(hint),
            signature: Signature(
                BytesM::try_from(signature.to_bytes().to_vec())
                    .map_err(|e| WalletError::Signing(e.to_string()))?,
            ),
        };

        let mut signatures = v1.signatures.to_vec();
        signatures.push(decorated);
        v1.signatures = signatures
            .try_into()
            .map_err(|_| WalletError::Signing("too many signatures".to_string()))?;

        Ok(TransactionEnvelope::Tx(v1))
    }
}

#[async_trait]
impl WalletProvider for LocalKeypairWallet {
    async fn is_connected(&self) -> Result<bool, WalletError> {
        Ok(self.key.is_some())
    }

    async fn is_allowed(&self) -> Result<bool, WalletError> {
        Ok(self.key.is_some() && self.allowed.load(Ordering::SeqCst))
    }

    async fn request_access(&self) -> Result<(), WalletError> {
        if self.key.is_none() {
            return Err(WalletError::AccessDenied);
        }
        self.allowed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_public_key(&self) -> Result<String, WalletError> {
        self.account()
            .map(|account| account.to_string())
            .ok_or(WalletError::NoAccount)
    }

    async fn sign_transaction(&self, xdr: &str, opts: &SignOptions) -> Result<String, WalletError> {
        let key = self.key.as_ref().ok_or(WalletError::NotInstalled)?;
        if !self.allowed.load(Ordering::SeqCst) {
            return Err(WalletError::AccessDenied);
        }

        let account = self.account().ok_or(WalletError::NoAccount)?;
        if account.to_string() != opts.account_to_sign {
            return Err(WalletError::Signing(format!(
                "wallet holds {}, asked to sign for {}",
                account, opts.account_to_sign
            )));
        }

        let envelope = decode_envelope(xdr).map_err(|e| WalletError::Signing(e.to_string()))?;
        let signed = self.sign_envelope(key, envelope, &opts.network_passphrase)?;

        tracing::debug!(account = %account, "Transaction signed");
        encode_envelope(&signed).map_err(|e| WalletError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for LocalKeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeypairWallet")
            .field("account", &self.account().map(|a| a.to_string()))
            .field("allowed", &self.allowed.load(Ordering::SeqCst))
            .finish()
    }
}
