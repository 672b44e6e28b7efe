//! Durable storage for the reputation ledger
//!
//! Everything above this module talks to a [`KvStore`]: atomic per-key reads
//! and writes, an insert that never overwrites, and compare-and-swap. Records
//! are MessagePack-encoded (same encoding the storage sidecar uses for sled).

mod memory;
mod sled_store;
mod store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use store::KvStore;

use serde::{de::DeserializeOwned, Serialize};

use crate::types::{LedgerError, Result};

/// Key prefix for action records (`actions/{uuid}`)
pub const ACTION_PREFIX: &str = "actions/";

/// Key prefix for custodial wallet records (`wallets/{email}`)
pub const WALLET_PREFIX: &str = "wallets/";

/// Submission sequence counter, a big-endian `u64` bumped by
/// [`KvStore::increment`]
pub const ACTION_SEQUENCE_KEY: &str = "meta/action_seq";

/// Encode a record for storage
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Read a counter written by [`KvStore::increment`]
pub(crate) fn decode_counter(key: &str, bytes: Option<&[u8]>) -> Result<u64> {
    match bytes {
        None => Ok(0),
        Some(bytes) => <[u8; 8]>::try_from(bytes)
            .map(u64::from_be_bytes)
            .map_err(|_| {
                LedgerError::StorageFailure(format!(
                    "counter {} holds {} bytes, expected 8",
                    key,
                    bytes.len()
                ))
            }),
    }
}
