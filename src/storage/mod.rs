//! Durable key/value persistence for the session store.
//!
//! The session store only needs string slots under a handful of keys, so the backend
//! contract is a small async trait. [`SqliteStore`] is the durable implementation and
//! [`MemoryStore`] backs tests and throwaway runs.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StorageResult;

/// String key/value storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `None` when unset.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Write a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Remove a key. Removing an unset key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}
