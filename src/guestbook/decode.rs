//! Strict decoding of the contract's `get_messages` return value.
//!
//! The contract returns `Vec<MessageData>` where each record is a map keyed by
//! symbol: `sender` (address), `message` (string), `timestamp` (u64 seconds).
//! Missing fields decode to `None`; anything of the wrong shape is an error.

use stellar_xdr::curr::{Limits, PublicKey, ReadXdr, ScAddress, ScMap, ScVal, Uint256};
use thiserror::Error;

use crate::blockchain::types::{AccountId, ContractId};

/// One decoded record before defaults and normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub sender: Option<String>,
    pub message: Option<String>,
    /// Raw ledger timestamp (seconds or milliseconds).
    pub timestamp: Option<u64>,
}

/// Reasons a return value is not a usable batch of records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid return value encoding: {0}")]
    Encoding(String),

    #[error("expected a list of records, got {0}")]
    NotAList(&'static str),

    #[error("record {0} is not a map")]
    NotARecord(usize),

    #[error("record {index} field '{field}' has unexpected type {found}")]
    FieldType {
        index: usize,
        field: &'static str,
        found: &'static str,
    },
}

/// Decode a base64 `ScVal` return value into records.
pub fn decode_return_value(xdr: &str) -> Result<Vec<RawEntry>, DecodeError> {
    let value = ScVal::from_xdr_base64(xdr, Limits::none())
        .map_err(|e| DecodeError::Encoding(e.to_string()))?;
    decode_records(&value)
}

/// Decode an `ScVal` into records.
pub fn decode_records(value: &ScVal) -> Result<Vec<RawEntry>, DecodeError> {
    let items: &[ScVal] = match value {
        ScVal::Vec(Some(items)) => &items.0,
        ScVal::Vec(None) => &[],
        other => return Err(DecodeError::NotAList(other.name())),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            ScVal::Map(Some(map)) => decode_record(index, map),
            ScVal::Map(None) => Ok(RawEntry::default()),
            _ => Err(DecodeError::NotARecord(index)),
        })
        .collect()
}

fn decode_record(index: usize, map: &ScMap) -> Result<RawEntry, DecodeError> {
    let mut entry = RawEntry::default();

    for pair in map.0.iter() {
        let Some(key) = key_name(&pair.key) else {
            continue;
        };
        match key.as_str() {
            "sender" => entry.sender = decode_sender(index, &pair.val)?,
            "message" => entry.message = decode_text(index, "message", &pair.val)?,
            "timestamp" => entry.timestamp = decode_timestamp(index, &pair.val)?,
            _ => {}
        }
    }

    Ok(entry)
}

fn key_name(key: &ScVal) -> Option<String> {
    match key {
        ScVal::Symbol(sym) => String::from_utf8(sym.0.to_vec()).ok(),
        ScVal::String(s) => String::from_utf8(s.0.to_vec()).ok(),
        _ => None,
    }
}

fn decode_sender(index: usize, value: &ScVal) -> Result<Option<String>, DecodeError> {
    match value {
        ScVal::Address(ScAddress::Account(stellar_xdr::curr::AccountId(
            PublicKey::PublicKeyTypeEd25519(Uint256(bytes)),
        ))) => Ok(Some(AccountId::from_bytes(*bytes).to_string())),
        ScVal::Address(ScAddress::Contract(hash)) => {
            Ok(Some(ContractId::from_bytes(hash.0).to_string()))
        }
        other => decode_text(index, "sender", other),
    }
}

fn decode_text(index: usize, field: &'static str, value: &ScVal) -> Result<Option<String>, DecodeError> {
    match value {
        ScVal::Void => Ok(None),
        ScVal::String(s) => Ok(Some(String::from_utf8_lossy(&s.0.to_vec()).into_owned())),
        ScVal::Symbol(s) => Ok(Some(String::from_utf8_lossy(&s.0.to_vec()).into_owned())),
        other => Err(DecodeError::FieldType {
            index,
            field,
            found: other.name(),
        }),
    }
}

fn decode_timestamp(index: usize, value: &ScVal) -> Result<Option<u64>, DecodeError> {
    let mismatch = |found| DecodeError::FieldType {
        index,
        field: "timestamp",
        found,
    };

    match value {
        ScVal::Void => Ok(None),
        ScVal::U64(v) => Ok(Some(*v)),
        ScVal::Timepoint(t) => Ok(Some(t.0)),
        ScVal::U32(v) => Ok(Some(u64::from(*v))),
        ScVal::I64(v) => u64::try_from(*v).map(Some).map_err(|_| mismatch("negative i64")),
        ScVal::I32(v) => u64::try_from(*v).map(Some).map_err(|_| mismatch("negative i32")),
        other => Err(mismatch(other.name())),
    }
}
