//! Persistent key-value stores for the progress document
//!
//! The tracker only ever sees the [`ProgressStore`] contract: read a string
//! under a key, write a string under a key. Everything else (file layout,
//! quotas, missing backends) stays behind it.

pub mod codec;
pub mod file;

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

pub use codec::{ProgressCodec, STORAGE_KEY};
pub use file::FileStore;

/// Errors that can occur when writing to a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure (disk full, permissions, quota)
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No platform data directory could be determined
    #[error("Failed to determine data directory")]
    NoDataDir,
}

/// String key-value store contract, the core's only external boundary
pub trait ProgressStore: Send {
    /// Read the value under `key`, or `None` if absent or unreadable
    fn read(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Store for contexts without any persistence backend: reads are always
/// absent and writes succeed as no-ops, so progress still works for the
/// session without being durable.
#[derive(Debug, Default)]
pub struct NullStore;

impl ProgressStore for NullStore {
    fn read(&self, _key: &str) -> Option<String> {
        None
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.read("k").is_none());

        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").as_deref(), Some("v"));
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.write("k", "first").unwrap();
        store.write("k", "second").unwrap();
        assert_eq!(store.read("k").as_deref(), Some("second"));
    }

    #[test]
    fn null_store_reads_nothing_and_accepts_writes() {
        let store = NullStore;
        assert!(store.write("k", "v").is_ok());
        assert!(store.read("k").is_none());
    }
}
