//! Transaction building, assembly, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build contract invocations with a fee budget and validity window
//! - Merge simulation footprint, resource fee and auth into a transaction
//! - Compute the network-scoped signature payload hash
//! - Monitor confirmation with a deadline and cancellation

use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
    Operation, OperationBody, Preconditions, PublicKey, ReadXdr, ScAddress, ScString, ScSymbol,
    ScVal, SequenceNumber, SorobanAuthorizationEntry, SorobanTransactionData, StringM, TimeBounds,
    TimePoint, Transaction, TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, Uint256, VecM, WriteXdr,
};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use crate::blockchain::client::LedgerRpc;
use crate::blockchain::types::{
    AccountId, AccountState, BlockchainError, BlockchainResult, ContractId, SimulationResponse,
    TransactionResponse, TransactionStatus,
};

/// Builds guestbook contract invocations for one network and contract.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    contract: ContractId,
    network_passphrase: String,
    base_fee: u32,
    tx_timeout_secs: u64,
}

impl TxBuilder {
    /// Create a new transaction builder.
    ///
    /// # Arguments
    /// * `contract` - Contract to invoke
    /// * `network_passphrase` - Network the transactions are valid on
    /// * `base_fee` - Inclusion fee in stroops, before resource fees
    /// * `tx_timeout_secs` - Validity window from build time
    pub fn new(
        contract: ContractId,
        network_passphrase: impl Into<String>,
        base_fee: u32,
        tx_timeout_secs: u64,
    ) -> Self {
        Self {
            contract,
            network_passphrase: network_passphrase.into(),
            base_fee,
            tx_timeout_secs,
        }
    }

    /// The network passphrase transactions are built for.
    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// The contract being invoked.
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Build an unsigned invocation of `function` with `source` as transaction source.
    ///
    /// The sequence number is the account's current sequence plus one.
    pub fn invoke(
        &self,
        source: &AccountState,
        function: &str,
        args: Vec<ScVal>,
    ) -> BlockchainResult<TransactionEnvelope> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let max_time = now
            .checked_add(self.tx_timeout_secs)
            .ok_or_else(|| BlockchainError::Xdr("validity window overflow".to_string()))?;

        let sequence = source
            .sequence
            .checked_add(1)
            .ok_or_else(|| BlockchainError::Xdr("sequence number overflow".to_string()))?;

        let operation = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(InvokeContractArgs {
                    contract_address: ScAddress::Contract(Hash(*self.contract.as_bytes())),
                    function_name: ScSymbol(StringM::try_from(function)?),
                    args: args.try_into()?,
                }),
                auth: VecM::default(),
            }),
        };

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(Uint256(*source.account_id.as_bytes())),
            fee: self.base_fee,
            seq_num: SequenceNumber(sequence),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(max_time),
            }),
            memo: Memo::None,
            operations: vec![operation].try_into()?,
            ext: TransactionExt::V0,
        };

        Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: VecM::default(),
        }))
    }

    /// Merge a successful simulation into the transaction.
    ///
    /// Adds the minimum resource fee to the fee, attaches the soroban
    /// footprint, and fills in authorization entries if the invocation has none.
    pub fn assemble(
        &self,
        envelope: &TransactionEnvelope,
        simulation: &SimulationResponse,
    ) -> BlockchainResult<TransactionEnvelope> {
        if let Some(err) = &simulation.error {
            return Err(BlockchainError::Xdr(format!("cannot assemble failed simulation: {}", err)));
        }

        let mut v1 = match envelope {
            TransactionEnvelope::Tx(v1) => v1.clone(),
            _ => return Err(BlockchainError::Xdr("unsupported envelope type".to_string())),
        };

        let data_xdr = simulation
            .transaction_data
            .as_deref()
            .ok_or_else(|| BlockchainError::Xdr("simulation returned no transaction data".to_string()))?;
        let data = SorobanTransactionData::from_xdr_base64(data_xdr, Limits::none())?;

        let resource_fee = match simulation.min_resource_fee.as_deref() {
            Some(fee) => fee
                .parse::<u32>()
                .map_err(|e| BlockchainError::Xdr(format!("invalid resource fee '{}': {}", fee, e)))?,
            None => 0,
        };
        v1.tx.fee = v1
            .tx
            .fee
            .checked_add(resource_fee)
            .ok_or_else(|| BlockchainError::Xdr("fee overflow".to_string()))?;
        v1.tx.ext = TransactionExt::V1(data);

        let auth = simulation
            .results
            .first()
            .map(|result| result.auth.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|entry| SorobanAuthorizationEntry::from_xdr_base64(entry, Limits::none()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut operations = v1.tx.operations.to_vec();
        if let Some(Operation {
            body: OperationBody::InvokeHostFunction(invoke),
            ..
        }) = operations.first_mut()
        {
            if invoke.auth.is_empty() {
                invoke.auth = auth.try_into()?;
            }
        }
        v1.tx.operations = operations.try_into()?;

        Ok(TransactionEnvelope::Tx(v1))
    }

    /// Wait for a submitted transaction to leave the `NOT_FOUND` state.
    ///
    /// The first check is immediate; each further check follows `poll_interval`.
    ///
    /// # Arguments
    /// * `rpc` - Ledger RPC to poll
    /// * `tx_hash` - Hex transaction hash returned by submission
    /// * `poll_interval` - Delay between checks
    /// * `deadline` - Maximum time to wait for a settled status
    /// * `cancel` - Aborts the wait when cancelled
    pub async fn wait_for_confirmation(
        &self,
        rpc: &dyn LedgerRpc,
        tx_hash: &str,
        poll_interval: Duration,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> BlockchainResult<TransactionResponse> {
        let poll = async {
            let mut response = rpc.get_transaction(tx_hash).await?;
            while response.status == TransactionStatus::NotFound {
                tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                sleep(poll_interval).await;
                response = rpc.get_transaction(tx_hash).await?;
            }
            Ok(response)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(tx_hash = %tx_hash, "Confirmation wait cancelled");
                Err(BlockchainError::Cancelled)
            }
            result = timeout(deadline, poll) => match result {
                Ok(status) => status,
                Err(_) => Err(BlockchainError::ConfirmationTimeout(deadline.as_secs())),
            },
        }
    }
}

/// Typed `Address` argument for an account.
pub fn address_arg(account: &AccountId) -> ScVal {
    ScVal::Address(ScAddress::Account(stellar_xdr::curr::AccountId(
        PublicKey::PublicKeyTypeEd25519(Uint256(*account.as_bytes())),
    )))
}

/// Typed `String` argument.
pub fn string_arg(value: &str) -> BlockchainResult<ScVal> {
    Ok(ScVal::String(ScString(StringM::try_from(value)?)))
}

/// Hash signed by the source account: SHA-256 over the network id and transaction.
pub fn transaction_hash(tx: &Transaction, network_passphrase: &str) -> BlockchainResult<[u8; 32]> {
    let network_id = Hash(Sha256::digest(network_passphrase.as_bytes()).into());
    let payload = TransactionSignaturePayload {
        network_id,
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    Ok(Sha256::digest(&bytes).into())
}

/// Encode an envelope to its base64 wire form.
pub fn encode_envelope(envelope: &TransactionEnvelope) -> BlockchainResult<String> {
    Ok(envelope.to_xdr_base64(Limits::none())?)
}

/// Decode an envelope from its base64 wire form.
pub fn decode_envelope(xdr: &str) -> BlockchainResult<TransactionEnvelope> {
    Ok(TransactionEnvelope::from_xdr_base64(xdr, Limits::none())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::SimulationResult;

    const ACCOUNT: &str = "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR";
    const CONTRACT: &str = "CD5HAABXEFWUTSQKYZI37SQBWU4BPRQL7Y6DWTB5SZLHNG52VIDJFYYM";
    // Empty footprint, zero resources and fee.
    const EMPTY_TX_DATA: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    fn builder() -> TxBuilder {
        TxBuilder::new(
            ContractId::parse(CONTRACT).unwrap(),
            "Test SDF Network ; September 2015",
            100_000,
            30,
        )
    }

    fn source() -> AccountState {
        AccountState {
            account_id: AccountId::parse(ACCOUNT).unwrap(),
            sequence: 41,
        }
    }

    #[test]
    fn test_invoke_builds_sequenced_transaction() {
        let envelope = builder()
            .invoke(&source(), "add_message", vec![string_arg("hi").unwrap()])
            .unwrap();

        let TransactionEnvelope::Tx(v1) = &envelope else {
            panic!("expected v1 envelope");
        };
        assert_eq!(v1.tx.seq_num.0, 42);
        assert_eq!(v1.tx.fee, 100_000);
        assert!(v1.signatures.is_empty());
        match &v1.tx.cond {
            Preconditions::Time(bounds) => assert!(bounds.max_time.0 > 0),
            other => panic!("unexpected preconditions {:?}", other),
        }
        match &v1.tx.operations[0].body {
            OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(call),
                ..
            }) => {
                assert_eq!(call.function_name.0.to_vec(), b"add_message".to_vec());
                assert_eq!(call.args.len(), 1);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_unbounded_validity_window_is_an_error() {
        let builder = TxBuilder::new(
            ContractId::parse(CONTRACT).unwrap(),
            "Test SDF Network ; September 2015",
            100_000,
            u64::MAX,
        );
        let result = builder.invoke(&source(), "get_messages", Vec::new());
        assert!(matches!(result, Err(BlockchainError::Xdr(_))));
    }

    #[test]
    fn test_envelope_wire_round_trip() {
        let account = AccountId::parse(ACCOUNT).unwrap();
        let envelope = builder()
            .invoke(&source(), "add_message", vec![address_arg(&account)])
            .unwrap();
        let decoded = decode_envelope(&encode_envelope(&envelope).unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_assemble_adds_resource_fee_and_footprint() {
        let envelope = builder().invoke(&source(), "get_messages", Vec::new()).unwrap();
        let simulation = SimulationResponse {
            transaction_data: Some(EMPTY_TX_DATA.to_string()),
            min_resource_fee: Some("58181".to_string()),
            results: vec![SimulationResult::default()],
            ..SimulationResponse::default()
        };

        let assembled = builder().assemble(&envelope, &simulation).unwrap();
        let TransactionEnvelope::Tx(v1) = assembled else {
            panic!("expected v1 envelope");
        };
        assert_eq!(v1.tx.fee, 158_181);
        assert!(matches!(v1.tx.ext, TransactionExt::V1(_)));
    }

    #[test]
    fn test_assemble_rejects_failed_simulation() {
        let envelope = builder().invoke(&source(), "get_messages", Vec::new()).unwrap();
        let simulation = SimulationResponse {
            error: Some("trapped".to_string()),
            ..SimulationResponse::default()
        };
        assert!(builder().assemble(&envelope, &simulation).is_err());
    }

    #[test]
    fn test_transaction_hash_depends_on_network() {
        let envelope = builder().invoke(&source(), "get_messages", Vec::new()).unwrap();
        let TransactionEnvelope::Tx(v1) = envelope else {
            panic!("expected v1 envelope");
        };
        let testnet = transaction_hash(&v1.tx, "Test SDF Network ; September 2015").unwrap();
        let mainnet =
            transaction_hash(&v1.tx, "Public Global Stellar Network ; September 2015").unwrap();
        assert_ne!(testnet, mainnet);
    }
}
