//! Shared doubles for integration testing: a scripted ledger and wallet.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stellar_xdr::curr::{
    HostFunction, InvokeContractArgs, InvokeHostFunctionOp, OperationBody, PublicKey, ScAddress,
    ScMap, ScMapEntry, ScString, ScSymbol, ScVal, ScVec, StringM, TransactionEnvelope, Uint256,
};
use stellar_xdr::curr::{Limits, WriteXdr};

use stellar_guestbook::blockchain::transaction::address_arg;
use stellar_guestbook::blockchain::types::{
    SendResponse, SendStatus, SimulationResponse, SimulationResult, TransactionResponse,
    TransactionStatus,
};
use stellar_guestbook::blockchain::{
    AccountId, AccountState, BlockchainError, BlockchainResult, LedgerRpc, SignOptions,
    WalletError, WalletProvider,
};
use stellar_guestbook::config::GuestbookConfig;

/// Funded reader account from the default config.
pub const READER_ACCOUNT: &str = "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR";

/// Empty footprint, zero resources and fee.
pub const EMPTY_TX_DATA: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

/// A user account whose strkey starts with `GABC`.
pub fn gabc_account() -> String {
    let mut key = [7u8; 32];
    key[0] = 0x02;
    key[1] = 0x20;
    AccountId::from_bytes(key).to_string()
}

/// Testnet defaults with local state kept under `data_dir`.
pub fn test_config(data_dir: &Path) -> GuestbookConfig {
    let mut config = GuestbookConfig::default();
    config.storage.data_dir = data_dir.display().to_string();
    config
}

pub fn symbol(s: &str) -> ScVal {
    ScVal::Symbol(ScSymbol(StringM::try_from(s).unwrap()))
}

pub fn string(s: &str) -> ScVal {
    ScVal::String(ScString(StringM::try_from(s).unwrap()))
}

/// One contract record as the guestbook contract encodes it.
pub fn record(sender: &str, message: &str, timestamp: u64) -> ScVal {
    let sender = address_arg(&AccountId::parse(sender).unwrap());
    let entries = vec![
        ScMapEntry { key: symbol("message"), val: string(message) },
        ScMapEntry { key: symbol("sender"), val: sender },
        ScMapEntry { key: symbol("timestamp"), val: ScVal::U64(timestamp) },
    ];
    ScVal::Map(Some(ScMap(entries.try_into().unwrap())))
}

pub fn list(items: Vec<ScVal>) -> ScVal {
    ScVal::Vec(Some(ScVec(items.try_into().unwrap())))
}

/// The contract call carried by a single-invocation envelope.
fn contract_call(envelope: &TransactionEnvelope) -> Option<&InvokeContractArgs> {
    let TransactionEnvelope::Tx(v1) = envelope else {
        return None;
    };
    match &v1.tx.operations.first()?.body {
        OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(call),
            ..
        }) => Some(call),
        _ => None,
    }
}

fn calls_function(envelope: &TransactionEnvelope, name: &str) -> bool {
    contract_call(envelope).is_some_and(|call| call.function_name.0.to_vec() == name.as_bytes())
}

/// How the ledger answers a `get_messages` simulation.
#[derive(Debug, Clone)]
pub enum ReadScript {
    /// Return every message recorded so far.
    Live,
    /// Return this exact value.
    Value(ScVal),
    /// Report a simulation failure.
    SimulationError(String),
    /// Succeed without a return value.
    NoReturnValue,
    /// Fail the request.
    RpcFailure,
}

/// Scripted in-memory ledger.
pub struct MockLedger {
    accounts: Mutex<HashMap<String, i64>>,
    read: Mutex<ReadScript>,
    write_simulation_error: Mutex<Option<String>>,
    send_status: Mutex<SendStatus>,
    statuses: Mutex<VecDeque<TransactionStatus>>,
    messages: Mutex<Vec<(String, String, u64)>>,
    clock_secs: Mutex<u64>,
    pub calls: AtomicUsize,
    pub simulations: AtomicUsize,
    pub sends: AtomicUsize,
    pub status_checks: AtomicUsize,
    pub account_lookups: Mutex<Vec<String>>,
}

impl MockLedger {
    /// A ledger knowing the reader account and `accounts`, answering reads live.
    pub fn new(accounts: &[&str]) -> Self {
        let mut known = HashMap::new();
        known.insert(READER_ACCOUNT.to_string(), 100);
        for account in accounts {
            known.insert(account.to_string(), 7);
        }
        Self {
            accounts: Mutex::new(known),
            read: Mutex::new(ReadScript::Live),
            write_simulation_error: Mutex::new(None),
            send_status: Mutex::new(SendStatus::Pending),
            statuses: Mutex::new(VecDeque::from(vec![TransactionStatus::Success])),
            messages: Mutex::new(Vec::new()),
            clock_secs: Mutex::new(1_700_000_000),
            calls: AtomicUsize::new(0),
            simulations: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            account_lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn shared(accounts: &[&str]) -> Arc<Self> {
        Arc::new(Self::new(accounts))
    }

    pub fn forget_account(&self, account: &str) {
        self.accounts.lock().unwrap().remove(account);
    }

    pub fn script_read(&self, script: ReadScript) {
        *self.read.lock().unwrap() = script;
    }

    pub fn fail_write_simulation(&self, error: &str) {
        *self.write_simulation_error.lock().unwrap() = Some(error.to_string());
    }

    pub fn script_send(&self, status: SendStatus) {
        *self.send_status.lock().unwrap() = status;
    }

    /// Statuses returned by successive `getTransaction` calls; `NOT_FOUND` once exhausted.
    pub fn script_statuses(&self, statuses: Vec<TransactionStatus>) {
        *self.statuses.lock().unwrap() = statuses.into();
    }

    pub fn seed_message(&self, sender: &str, message: &str, timestamp: u64) {
        self.messages
            .lock()
            .unwrap()
            .push((sender.to_string(), message.to_string(), timestamp));
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn live_value(&self) -> ScVal {
        let records = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .map(|(sender, message, ts)| record(sender, message, *ts))
            .collect();
        list(records)
    }

    fn record_submission(&self, envelope: &TransactionEnvelope) {
        let Some(call) = contract_call(envelope) else {
            return;
        };
        let args = call.args.to_vec();
        let sender = match args.first() {
            Some(ScVal::Address(ScAddress::Account(stellar_xdr::curr::AccountId(
                PublicKey::PublicKeyTypeEd25519(Uint256(bytes)),
            )))) => AccountId::from_bytes(*bytes).to_string(),
            _ => return,
        };
        let message = match args.get(1) {
            Some(ScVal::String(s)) => String::from_utf8(s.0.to_vec()).unwrap(),
            _ => return,
        };
        let mut clock = self.clock_secs.lock().unwrap();
        *clock += 60;
        self.seed_message(&sender, &message, *clock);
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_account(&self, account: &AccountId) -> BlockchainResult<AccountState> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = account.to_string();
        self.account_lookups.lock().unwrap().push(key.clone());
        match self.accounts.lock().unwrap().get(&key) {
            Some(sequence) => Ok(AccountState {
                account_id: account.clone(),
                sequence: *sequence,
            }),
            None => Err(BlockchainError::AccountNotFound(key)),
        }
    }

    async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> BlockchainResult<SimulationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.simulations.fetch_add(1, Ordering::SeqCst);

        if calls_function(envelope, "add_message") {
            if let Some(error) = self.write_simulation_error.lock().unwrap().clone() {
                return Ok(SimulationResponse {
                    error: Some(error),
                    ..SimulationResponse::default()
                });
            }
            return Ok(SimulationResponse {
                transaction_data: Some(EMPTY_TX_DATA.to_string()),
                min_resource_fee: Some("100".to_string()),
                results: vec![SimulationResult {
                    auth: Vec::new(),
                    xdr: "AAAAAQ==".to_string(),
                }],
                ..SimulationResponse::default()
            });
        }

        let script = self.read.lock().unwrap().clone();
        let value = match script {
            ReadScript::Live => self.live_value(),
            ReadScript::Value(value) => value,
            ReadScript::SimulationError(error) => {
                return Ok(SimulationResponse {
                    error: Some(error),
                    ..SimulationResponse::default()
                })
            }
            ReadScript::NoReturnValue => return Ok(SimulationResponse::default()),
            ReadScript::RpcFailure => {
                return Err(BlockchainError::Rpc("all endpoints failed".to_string()))
            }
        };

        Ok(SimulationResponse {
            transaction_data: Some(EMPTY_TX_DATA.to_string()),
            results: vec![SimulationResult {
                auth: Vec::new(),
                xdr: value.to_xdr_base64(Limits::none()).unwrap(),
            }],
            ..SimulationResponse::default()
        })
    }

    async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> BlockchainResult<SendResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sends.fetch_add(1, Ordering::SeqCst);

        let status = *self.send_status.lock().unwrap();
        if status != SendStatus::Error {
            self.record_submission(envelope);
        }
        Ok(SendResponse {
            status,
            hash: "ab".repeat(32),
            error_result_xdr: (status == SendStatus::Error).then(|| "AAAAAAAAAGT////7AAAAAA==".to_string()),
        })
    }

    async fn get_transaction(&self, _hash: &str) -> BlockchainResult<TransactionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TransactionStatus::NotFound);
        Ok(TransactionResponse {
            status,
            ledger: (status == TransactionStatus::Success).then_some(1234),
        })
    }
}

/// Scripted wallet. Signing returns the envelope unchanged.
pub struct MockWallet {
    connected: bool,
    allowed: AtomicBool,
    grant_access: bool,
    public_key: Option<String>,
    sign_error: Mutex<Option<WalletError>>,
    pub calls: AtomicUsize,
    pub signed: Mutex<Vec<SignOptions>>,
}

impl MockWallet {
    /// A connected, allowed wallet holding `public_key`.
    pub fn allowed(public_key: &str) -> Self {
        Self {
            connected: true,
            allowed: AtomicBool::new(true),
            grant_access: true,
            public_key: Some(public_key.to_string()),
            sign_error: Mutex::new(None),
            calls: AtomicUsize::new(0),
            signed: Mutex::new(Vec::new()),
        }
    }

    /// A connected wallet that has not yet granted access but will when asked.
    pub fn not_yet_allowed(public_key: &str) -> Self {
        let wallet = Self::allowed(public_key);
        wallet.allowed.store(false, Ordering::SeqCst);
        wallet
    }

    /// A wallet that is present but refuses access.
    pub fn refusing(public_key: &str) -> Self {
        let mut wallet = Self::not_yet_allowed(public_key);
        wallet.grant_access = false;
        wallet
    }

    /// No wallet installed.
    pub fn absent() -> Self {
        Self {
            connected: false,
            allowed: AtomicBool::new(false),
            grant_access: false,
            public_key: None,
            sign_error: Mutex::new(None),
            calls: AtomicUsize::new(0),
            signed: Mutex::new(Vec::new()),
        }
    }

    /// Withdraw the permission granted earlier.
    pub fn revoke_access(&self) {
        self.allowed.store(false, Ordering::SeqCst);
    }

    pub fn reject_signing(&self, error: WalletError) {
        *self.sign_error.lock().unwrap() = Some(error);
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn is_connected(&self) -> Result<bool, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.connected)
    }

    async fn is_allowed(&self) -> Result<bool, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.allowed.load(Ordering::SeqCst))
    }

    async fn request_access(&self) -> Result<(), WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.connected {
            return Err(WalletError::NotInstalled);
        }
        if !self.grant_access {
            return Err(WalletError::AccessDenied);
        }
        self.allowed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn get_public_key(&self) -> Result<String, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.allowed.load(Ordering::SeqCst) {
            return Err(WalletError::AccessDenied);
        }
        self.public_key.clone().ok_or(WalletError::NoAccount)
    }

    async fn sign_transaction(&self, xdr: &str, opts: &SignOptions) -> Result<String, WalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.sign_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.signed.lock().unwrap().push(opts.clone());
        Ok(xdr.to_string())
    }
}
