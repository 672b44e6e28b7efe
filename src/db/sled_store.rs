//! sled-backed durable store
//!
//! Pattern adapted from elohim-storage's metadata database.

use std::path::Path;

use async_trait::async_trait;
use sled::Db;
use tracing::info;

use super::{decode_counter, KvStore};
use crate::types::{LedgerError, Result};

/// Durable [`KvStore`] on a local sled database
#[derive(Clone)]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened ledger database");
        Ok(Self { db })
    }

    /// Temporary database removed on drop (tests)
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl KvStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool> {
        let outcome = self
            .db
            .compare_and_swap(key.as_bytes(), expected, Some(new))?;
        Ok(outcome.is_ok())
    }

    async fn increment(&self, key: &str) -> Result<u64> {
        // A malformed counter is left untouched so the decode below reports it
        let updated = self.db.update_and_fetch(key.as_bytes(), |old| match old {
            None => Some(1u64.to_be_bytes().to_vec()),
            Some(bytes) => match <[u8; 8]>::try_from(bytes) {
                Ok(raw) => Some((u64::from_be_bytes(raw) + 1).to_be_bytes().to_vec()),
                Err(_) => Some(bytes.to_vec()),
            },
        })?;
        let value = updated.ok_or_else(|| {
            LedgerError::StorageFailure(format!("counter {} vanished during update", key))
        })?;
        decode_counter(key, Some(&value[..]))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut records = Vec::new();
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, value) = item?;
            if let Ok(key) = String::from_utf8(key.to_vec()) {
                records.push((key, value.to_vec()));
            }
        }
        Ok(records)
    }

    async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = SledStore::open(dir.path()).unwrap();
            store.put("wallets/a@example.com", vec![1, 2, 3]).await.unwrap();
            store.flush().await.unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("wallets/a@example.com").await.unwrap(),
            Some(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn test_compare_and_swap_rejects_stale_bytes() {
        let store = SledStore::temporary().unwrap();

        assert!(store.compare_and_swap("k", None, vec![1]).await.unwrap());
        assert!(!store.compare_and_swap("k", Some(&[9]), vec![2]).await.unwrap());
        assert!(store.compare_and_swap("k", Some(&[1]), vec![2]).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_increment_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = SledStore::open(dir.path()).unwrap();
            assert_eq!(store.increment("meta/n").await.unwrap(), 1);
            assert_eq!(store.increment("meta/n").await.unwrap(), 2);
            store.flush().await.unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.increment("meta/n").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_increment_rejects_malformed_counter() {
        let store = SledStore::temporary().unwrap();
        store.put("meta/n", vec![7]).await.unwrap();

        assert!(matches!(
            store.increment("meta/n").await,
            Err(LedgerError::StorageFailure(_))
        ));
        assert_eq!(store.get("meta/n").await.unwrap(), Some(vec![7]));
    }
}
