//! Local bookkeeping of messages sent from this machine.
//!
//! A single JSON file; reads degrade to an empty list and writes never fail
//! the caller. The displayed entry list is always read from the ledger.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::guestbook::entry::now_millis;

/// File name of the store inside the data directory.
pub const STORE_FILE_NAME: &str = "stellar-guestbook-user-messages.json";

/// A message the local user sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub sender: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl StoredMessage {
    /// A new record stamped with a fresh id and the current time.
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.into(),
            message: message.into(),
            timestamp: now_millis(),
        }
    }
}

/// JSON-file store of [`StoredMessage`]s.
#[derive(Debug, Clone)]
pub struct LocalMessageStore {
    path: PathBuf,
}

impl LocalMessageStore {
    /// Store rooted at `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored messages; empty on a missing or unreadable file.
    pub fn load(&self) -> Vec<StoredMessage> {
        match self.try_load() {
            Ok(messages) => messages,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Local messages unavailable");
                Vec::new()
            }
        }
    }

    /// Replace the stored list.
    pub fn save(&self, messages: &[StoredMessage]) {
        match self.try_save(messages) {
            Ok(()) => tracing::debug!(count = messages.len(), "Saved local messages"),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Failed to save local messages")
            }
        }
    }

    /// Add one message to the end of the stored list.
    pub fn append(&self, message: StoredMessage) {
        let mut messages = self.load();
        messages.push(message);
        self.save(&messages);
    }

    /// Remove the store file.
    pub fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Failed to clear local messages");
        }
    }

    fn try_load(&self) -> std::io::Result<Vec<StoredMessage>> {
        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn try_save(&self, messages: &[StoredMessage]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer(BufWriter::new(file), messages)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalMessageStore::new(dir.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_append_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = LocalMessageStore::new(dir.path().join("nested"));

        store.append(StoredMessage::new("GABC", "first"));
        store.append(StoredMessage::new("GABC", "second"));

        let loaded = store.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].message, "first");
        assert_eq!(loaded[1].message, "second");
        assert_ne!(loaded[0].id, loaded[1].id);

        store.clear();
        assert!(store.load().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalMessageStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());

        // A corrupt file is overwritten by the next append.
        store.append(StoredMessage::new("GABC", "hello"));
        assert_eq!(store.load().len(), 1);
    }
}
