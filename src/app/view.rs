//! Display formatting and view models.

use chrono::{DateTime, Utc};

use crate::guestbook::entry::GuestbookEntry;

/// Skeleton rows shown while entries load.
pub const SKELETON_ROWS: usize = 3;

/// Text shown when the guestbook has no entries.
pub const EMPTY_TEXT: &str = "No messages yet. Would you like to leave the first one?";

/// Shown in place of a timestamp that cannot be represented.
pub const INVALID_DATE: &str = "Invalid date";

/// Shorten a sender for list rows: `first6...last4`.
pub fn truncate_sender(sender: &str) -> String {
    truncate(sender, 6, 4)
}

/// Shorten an address for the connection panel: `first8...last8`.
pub fn truncate_address(address: &str) -> String {
    truncate(address, 8, 8)
}

fn truncate(value: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return value.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}...{}", start, end)
}

/// Absolute time, e.g. `Nov 14, 2023, 22:13` (UTC).
pub fn format_timestamp(timestamp_ms: u64) -> String {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%b %-d, %Y, %H:%M").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// Coarse time relative to `now_ms`, e.g. `3 hours ago`.
pub fn relative_time(timestamp_ms: u64, now_ms: u64) -> String {
    let secs = now_ms.saturating_sub(timestamp_ms) / 1000;
    let (amount, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}

pub fn explorer_account_url(explorer: &str, account: &str) -> String {
    format!("{}/account/{}", explorer.trim_end_matches('/'), account)
}

pub fn explorer_contract_url(explorer: &str, contract: &str) -> String {
    format!("{}/contract/{}", explorer.trim_end_matches('/'), contract)
}

/// Wallet connection panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionPanel {
    Disconnected,
    Connected {
        address: String,
        short_address: String,
        explorer_url: String,
    },
}

/// Message form as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub text: String,
    pub counter: String,
    pub disabled: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

/// One rendered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRow {
    pub id: String,
    pub sender: String,
    pub short_sender: String,
    pub message: String,
    pub time: String,
    pub relative_time: String,
}

impl EntryRow {
    pub fn from_entry(entry: &GuestbookEntry, now_ms: u64) -> Self {
        Self {
            id: entry.id.clone(),
            sender: entry.sender.clone(),
            short_sender: truncate_sender(&entry.sender),
            message: entry.message.clone(),
            time: format_timestamp(entry.timestamp),
            relative_time: relative_time(entry.timestamp, now_ms),
        }
    }
}

/// Entry list as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryListView {
    Loading { skeleton_rows: usize },
    Empty { text: &'static str },
    Entries { rows: Vec<EntryRow>, sample: bool },
}

impl EntryListView {
    pub fn build(entries: &[GuestbookEntry], is_loading: bool, sample: bool, now_ms: u64) -> Self {
        if is_loading {
            EntryListView::Loading {
                skeleton_rows: SKELETON_ROWS,
            }
        } else if entries.is_empty() {
            EntryListView::Empty { text: EMPTY_TEXT }
        } else {
            EntryListView::Entries {
                rows: entries
                    .iter()
                    .map(|entry| EntryRow::from_entry(entry, now_ms))
                    .collect(),
                sample,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "GAIH3ULLFQ4DGSECF2AR555KZ4KNDGEKN4AFI4SU2M7B43MGK3QJZNSR";

    #[test]
    fn test_truncation() {
        assert_eq!(truncate_sender(ACCOUNT), "GAIH3U...ZNSR");
        assert_eq!(truncate_address(ACCOUNT), "GAIH3ULL...K3QJZNSR");
        assert_eq!(truncate_sender("Unknown"), "Unknown");
        assert_eq!(truncate_sender("ABCDEFGHIJ"), "ABCDEFGHIJ");
        assert_eq!(truncate_sender("ABCDEFGHIJK"), "ABCDEF...HIJK");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_700_000_000_000), "Nov 14, 2023, 22:13");
        assert_eq!(format_timestamp(0), "Jan 1, 1970, 00:00");
        assert_eq!(format_timestamp(u64::MAX), INVALID_DATE);
    }

    #[test]
    fn test_relative_time() {
        let now = 1_700_000_000_000;
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now + 5_000, now), "just now");
        assert_eq!(relative_time(now - 60_000, now), "1 minute ago");
        assert_eq!(relative_time(now - 7_200_000, now), "2 hours ago");
        assert_eq!(relative_time(now - 3 * 86_400_000, now), "3 days ago");
    }

    #[test]
    fn test_explorer_urls() {
        let base = "https://stellar.expert/explorer/testnet/";
        assert_eq!(
            explorer_account_url(base, "GABC"),
            "https://stellar.expert/explorer/testnet/account/GABC"
        );
        assert!(explorer_contract_url(base, "CABC").ends_with("/contract/CABC"));
    }

    #[test]
    fn test_list_states() {
        assert_eq!(
            EntryListView::build(&[], true, false, 0),
            EntryListView::Loading { skeleton_rows: 3 }
        );
        assert_eq!(
            EntryListView::build(&[], false, false, 0),
            EntryListView::Empty { text: EMPTY_TEXT }
        );

        let entry = GuestbookEntry {
            id: "contract-0".to_string(),
            sender: ACCOUNT.to_string(),
            message: "hi".to_string(),
            timestamp: 1_700_000_000_000,
        };
        match EntryListView::build(&[entry], false, true, 1_700_000_000_000) {
            EntryListView::Entries { rows, sample } => {
                assert!(sample);
                assert_eq!(rows[0].short_sender, "GAIH3U...ZNSR");
                assert_eq!(rows[0].relative_time, "just now");
            }
            other => panic!("unexpected view {:?}", other),
        }
    }
}
