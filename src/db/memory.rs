//! In-memory store for tests and dev mode

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{decode_counter, KvStore};
use crate::types::Result;

/// Non-durable [`KvStore`] backed by an ordered map
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.records.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Vec<u8>,
    ) -> Result<bool> {
        let mut records = self.records.write().await;
        let current = records.get(key).map(Vec::as_slice);
        if current != expected {
            return Ok(false);
        }
        records.insert(key.to_string(), new);
        Ok(true)
    }

    async fn increment(&self, key: &str) -> Result<u64> {
        let mut records = self.records.write().await;
        let next = decode_counter(key, records.get(key).map(Vec::as_slice))? + 1;
        records.insert(key.to_string(), next.to_be_bytes().to_vec());
        Ok(next)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let records = self.records.read().await;
        Ok(records
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryStore::new();

        assert!(store.compare_and_swap("k", None, b"one".to_vec()).await.unwrap());
        // Absent expectation no longer holds
        assert!(!store.compare_and_swap("k", None, b"two".to_vec()).await.unwrap());
        // Stale expectation
        assert!(!store
            .compare_and_swap("k", Some(b"zero"), b"two".to_vec())
            .await
            .unwrap());
        assert!(store
            .compare_and_swap("k", Some(b"one"), b"two".to_vec())
            .await
            .unwrap());

        assert_eq!(store.get("k").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first_writer() {
        let store = MemoryStore::new();

        assert_eq!(store.insert_if_absent("k", b"first".to_vec()).await.unwrap(), None);
        assert_eq!(
            store.insert_if_absent("k", b"second".to_vec()).await.unwrap(),
            Some(b"first".to_vec())
        );
        assert_eq!(store.get("k").await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_increment_counts_from_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("meta/n").await.unwrap(), 1);
        assert_eq!(store.increment("meta/n").await.unwrap(), 2);
        assert_eq!(store.get("meta/n").await.unwrap(), Some(2u64.to_be_bytes().to_vec()));

        store.put("meta/bad", vec![1, 2, 3]).await.unwrap();
        assert!(matches!(
            store.increment("meta/bad").await,
            Err(crate::types::LedgerError::StorageFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_prefix_is_bounded_and_ordered() {
        let store = MemoryStore::new();
        store.put("actions/b", vec![2]).await.unwrap();
        store.put("actions/a", vec![1]).await.unwrap();
        store.put("wallets/x", vec![3]).await.unwrap();
        store.put("actionsz", vec![4]).await.unwrap();

        let keys: Vec<String> = store
            .scan_prefix("actions/")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        assert_eq!(keys, vec!["actions/a", "actions/b"]);
    }
}
