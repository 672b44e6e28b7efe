//! Key-value store trait

use async_trait::async_trait;

use crate::types::{LedgerError, Result};

/// Atomic per-record key-value storage.
///
/// Implementations must make every single-key operation atomic. Nothing here
/// spans more than one key; callers that need read-modify-write use
/// [`KvStore::compare_and_swap`] against the bytes they read.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a record
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Unconditionally write a record
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Replace the record at `key` with `new` only if it currently equals
    /// `expected` (`None` meaning absent). Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool>;

    /// Atomically add one to the big-endian `u64` counter at `key` (absent
    /// counts as zero) and return the new value. Never fails on contention.
    async fn increment(&self, key: &str) -> Result<u64>;

    /// List all records whose key starts with `prefix`, in key order
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Insert a record unless one exists.
    ///
    /// Returns `None` when this call created the record, or the existing
    /// bytes when another writer got there first.
    async fn insert_if_absent(&self, key: &str, value: Vec<u8>) -> Result<Option<Vec<u8>>> {
        if self.compare_and_swap(key, None, value).await? {
            return Ok(None);
        }
        match self.get(key).await? {
            Some(existing) => Ok(Some(existing)),
            None => Err(LedgerError::StorageFailure(format!(
                "record {} rejected insert but is absent",
                key
            ))),
        }
    }

    /// Flush pending writes to durable media
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
