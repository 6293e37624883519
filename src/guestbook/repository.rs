//! Read path: fetch, decode and normalize guestbook entries.
//!
//! # Fallback policy
//! A ledger read never surfaces an error. Any failure along the way is
//! logged, counted by cause, and replaced with the sample dataset (or an
//! empty list when sample data is disabled).

use std::sync::Arc;

use crate::blockchain::{AccountId, AccountState, LedgerRpc, TxBuilder, WalletProvider};
use crate::config::ReaderConfig;
use crate::guestbook::decode::{decode_return_value, RawEntry};
use crate::guestbook::entry::{
    normalize_timestamp, now_millis, sample_entries, sort_newest_first, GuestbookEntry,
    EMPTY_MESSAGE, SYNTHETIC_SPACING_MS, UNKNOWN_SENDER,
};
use crate::observability::metrics;

/// Contract function returning every recorded message.
pub const READ_FUNCTION: &str = "get_messages";

/// Why a fetch fell back to sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCause {
    /// Neither the wallet account nor the configured reader account could be loaded.
    NoReaderAccount,
    /// The node ran the simulation and reported a failure.
    SimulationFailed,
    /// The simulation succeeded but carried no return value.
    NoReturnValue,
    /// The return value was not a list of message records.
    DecodeFailed,
    /// The simulation request itself failed.
    RpcError,
}

impl FallbackCause {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackCause::NoReaderAccount => "no_reader_account",
            FallbackCause::SimulationFailed => "simulation_failed",
            FallbackCause::NoReturnValue => "no_return_value",
            FallbackCause::DecodeFailed => "decode_failed",
            FallbackCause::RpcError => "rpc_error",
        }
    }
}

/// Where a batch of entries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Ledger,
    Sample(FallbackCause),
}

impl EntrySource {
    pub fn is_sample(&self) -> bool {
        matches!(self, EntrySource::Sample(_))
    }
}

/// Entries together with their provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub entries: Vec<GuestbookEntry>,
    pub source: EntrySource,
}

/// Reads the guestbook through transaction simulation.
pub struct EntryRepository {
    rpc: Arc<dyn LedgerRpc>,
    wallet: Arc<dyn WalletProvider>,
    builder: TxBuilder,
    config: ReaderConfig,
}

impl EntryRepository {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        wallet: Arc<dyn WalletProvider>,
        builder: TxBuilder,
        config: ReaderConfig,
    ) -> Self {
        Self {
            rpc,
            wallet,
            builder,
            config,
        }
    }

    /// Fetch the entries, newest first. Never fails.
    pub async fn fetch_entries(&self) -> Vec<GuestbookEntry> {
        self.fetch().await.entries
    }

    /// Fetch the entries along with where they came from.
    pub async fn fetch(&self) -> FetchOutcome {
        match self.read_ledger().await {
            Ok(entries) => {
                tracing::info!(count = entries.len(), "Loaded guestbook entries from ledger");
                FetchOutcome {
                    entries,
                    source: EntrySource::Ledger,
                }
            }
            Err(cause) => self.fallback(cause),
        }
    }

    async fn read_ledger(&self) -> Result<Vec<GuestbookEntry>, FallbackCause> {
        let reader = self
            .resolve_reader()
            .await
            .ok_or(FallbackCause::NoReaderAccount)?;

        let envelope = self
            .builder
            .invoke(&reader, READ_FUNCTION, Vec::new())
            .map_err(|e| {
                tracing::debug!(error = %e, "Failed to build read invocation");
                FallbackCause::RpcError
            })?;

        let simulation = self.rpc.simulate_transaction(&envelope).await.map_err(|e| {
            tracing::debug!(error = %e, "Simulation request failed");
            FallbackCause::RpcError
        })?;

        if let Some(error) = &simulation.error {
            tracing::debug!(error = %error, "Simulation reported failure");
            return Err(FallbackCause::SimulationFailed);
        }

        let xdr = simulation
            .return_value()
            .ok_or(FallbackCause::NoReturnValue)?;

        let records = decode_return_value(xdr).map_err(|e| {
            tracing::debug!(error = %e, "Unexpected return value shape");
            FallbackCause::DecodeFailed
        })?;

        Ok(normalize_records(records, now_millis()))
    }

    /// The account used as simulation source: the wallet's if available,
    /// otherwise the configured funded account.
    async fn resolve_reader(&self) -> Option<AccountState> {
        if let Some(account) = self.wallet_account().await {
            match self.rpc.get_account(&account).await {
                Ok(state) => return Some(state),
                Err(e) => {
                    tracing::debug!(account = %account, error = %e, "Wallet account lookup failed");
                }
            }
        }

        let fallback = match AccountId::parse(&self.config.fallback_account) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "Configured reader account is invalid");
                return None;
            }
        };

        match self.rpc.get_account(&fallback).await {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::debug!(account = %fallback, error = %e, "Reader account lookup failed");
                None
            }
        }
    }

    async fn wallet_account(&self) -> Option<AccountId> {
        if !self.wallet.is_connected().await.unwrap_or(false) {
            return None;
        }
        if !self.wallet.is_allowed().await.unwrap_or(false) {
            return None;
        }
        let key = self.wallet.get_public_key().await.ok()?;
        AccountId::parse(&key).ok()
    }

    fn fallback(&self, cause: FallbackCause) -> FetchOutcome {
        tracing::warn!(cause = cause.as_str(), "Ledger read failed, showing sample data");
        metrics::record_fallback(cause.as_str());

        let entries = if self.config.show_sample_data {
            sample_entries(&self.builder.contract().to_string(), now_millis())
        } else {
            Vec::new()
        };

        FetchOutcome {
            entries,
            source: EntrySource::Sample(cause),
        }
    }
}

/// Apply defaults, assign ids and order newest first.
///
/// Records without a timestamp are spaced an hour apart back from `now_ms`
/// by their position in the batch.
pub fn normalize_records(records: Vec<RawEntry>, now_ms: u64) -> Vec<GuestbookEntry> {
    let mut entries: Vec<GuestbookEntry> = records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let timestamp = match raw.timestamp {
                Some(ts) if ts > 0 => normalize_timestamp(ts),
                _ => now_ms.saturating_sub((index as u64).saturating_mul(SYNTHETIC_SPACING_MS)),
            };

            GuestbookEntry {
                id: format!("contract-{}", index),
                sender: non_empty(raw.sender).unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
                message: non_empty(raw.message).unwrap_or_else(|| EMPTY_MESSAGE.to_string()),
                timestamp,
            }
        })
        .collect();

    sort_newest_first(&mut entries);
    entries
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
