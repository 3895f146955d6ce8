//! Persistent key-value storage.
//!
//! The storefront keeps its client-side state (cart, wishlist, auth tokens,
//! cached profile) in a scoped, synchronous string-keyed store. The store is
//! injected as a [`KeyValueStore`] trait object so tests can substitute an
//! in-memory fake and the CLI can use a JSON file on disk.
//!
//! # Key ownership
//!
//! | Key | Owner |
//! |---|---|
//! | [`CART_KEY`], [`WISHLIST_KEY`] | [`CartStore`](crate::cart::CartStore) |
//! | [`ACCESS_TOKEN_KEY`], [`REFRESH_TOKEN_KEY`] | [`ApiClient`](crate::api::ApiClient) |
//! | [`USER_DATA_KEY`] | [`SessionManager`](crate::session::SessionManager) |
//!
//! There is no locking across owners and no cross-process consistency: the
//! last writer wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use thiserror::Error;

/// Key holding the serialized cart lines.
pub const CART_KEY: &str = "cart";
/// Key holding the serialized wishlist entries.
pub const WISHLIST_KEY: &str = "wishlist";
/// Key holding the bearer access token.
pub const ACCESS_TOKEN_KEY: &str = "authToken";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Key holding the last fetched user profile.
pub const USER_DATA_KEY: &str = "userData";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The write would exceed the store's capacity.
    #[error("storage quota exceeded writing '{key}' (limit {limit} bytes)")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Capacity of the store in bytes.
        limit: usize,
    },

    /// The store cannot be used (e.g. a poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A synchronous, string-keyed, string-valued store.
///
/// Implementations give no transactional guarantees. `remove` of an absent
/// key is not an error.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the previous value is kept.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to the injected store.
pub type SharedStore = Arc<dyn KeyValueStore>;
