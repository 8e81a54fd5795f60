//! Key-value persistence backends. Each value is a whole serialized document stored under a
//! single key; writes replace the previous value.

#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

/// Abstraction over a string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when the key was never written.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
