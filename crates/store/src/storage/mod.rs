//! Durable key-value storage backends.
//!
//! The pantry persists exactly one value (a JSON array under a fixed key), so the contract
//! is a minimal string key-value store: synchronous, bounded, no transactions.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub mod file;
pub mod in_memory;

pub use file::FileStorage;
pub use in_memory::InMemoryStorage;

/// Storage operation error.
///
/// These are **infrastructure errors**. None of them is fatal to the pantry: a failed read
/// loads an empty list and a failed write leaves the session running on in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open storage directory {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read key {key:?}: {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key {key:?}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage quota exceeded writing {key:?} ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("failed to serialize products: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Synchronous string key-value storage (the local-storage contract).
pub trait DurableStorage {
    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> DurableStorage for Arc<S>
where
    S: DurableStorage + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
