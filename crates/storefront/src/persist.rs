//! Serialization layer between in-memory state and the key-value store.
//!
//! Reads never fail: an absent key, an unreadable store, or a value that no
//! longer decodes all come back as "nothing stored". Writes report their
//! error so the caller can surface it as a warning.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::storage::{KeyValueStore, StorageError};

/// Load a list stored under `key`, or an empty list.
pub fn load_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    load_value(store, key).unwrap_or_default()
}

/// Load a single value stored under `key`.
///
/// Returns `None` when the key is absent, the store cannot be read, or the
/// stored text does not decode as `T`.
pub fn load_value<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read from storage, treating as absent");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored value is malformed, treating as absent");
            None
        }
    }
}

/// Serialize `items` and store them under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the store write fails.
pub fn save_list<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    save_value(store, key, items)
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the store write fails.
pub fn save_value<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
