//! Key custody backends
//!
//! Custodial wallets never store a private key in the clear. A [`KeyCustody`]
//! backend generates the keypair and hands back a sealed envelope; only the
//! backend can open it again. Swapping the local backend for an external
//! key-management service means implementing this trait.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::crypto::{
    decrypt_private_key, encrypt_private_key, generate_keypair, generate_random_bytes,
    MASTER_KEY_LEN, NONCE_LEN,
};
use crate::types::{LedgerError, Result};

/// Current envelope format version
pub const ENVELOPE_VERSION: u32 = 1;

/// Sealed key material as persisted in a wallet record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEnvelope {
    /// Backend that sealed this key (e.g. "local-chacha20poly1305")
    pub backend: String,

    /// Envelope format version
    pub key_version: u32,

    /// Ed25519 public key (base64)
    pub public_key: String,

    /// Encrypted private key (base64)
    pub encrypted_private_key: String,

    /// Encryption nonce (base64)
    pub encryption_nonce: String,
}

/// Capability that creates and opens custodial keys
pub trait KeyCustody: Send + Sync {
    /// Name recorded in every envelope this backend seals
    fn backend(&self) -> &'static str;

    /// Generate a fresh keypair and seal its private half
    fn generate(&self) -> Result<(VerifyingKey, CustodyEnvelope)>;

    /// Recover the signing key from an envelope this backend sealed
    fn open(&self, envelope: &CustodyEnvelope) -> Result<SigningKey>;
}

/// Local backend: private keys encrypted with ChaCha20-Poly1305 under one
/// master key held by the process.
pub struct LocalEncryptedCustody {
    master_key: Zeroizing<[u8; MASTER_KEY_LEN]>,
}

impl LocalEncryptedCustody {
    pub const BACKEND: &'static str = "local-chacha20poly1305";

    pub fn new(master_key: Zeroizing<[u8; MASTER_KEY_LEN]>) -> Self {
        Self { master_key }
    }

    /// Fixed, publicly known key for dev mode and tests
    pub fn insecure_dev() -> Self {
        Self::new(Zeroizing::new([0x42; MASTER_KEY_LEN]))
    }
}

impl KeyCustody for LocalEncryptedCustody {
    fn backend(&self) -> &'static str {
        Self::BACKEND
    }

    fn generate(&self) -> Result<(VerifyingKey, CustodyEnvelope)> {
        let (signing_key, verifying_key) = generate_keypair();
        let nonce: [u8; NONCE_LEN] = generate_random_bytes();

        let private_key = Zeroizing::new(signing_key.to_bytes());
        let encrypted = encrypt_private_key(&private_key, &self.master_key, &nonce)?;

        let envelope = CustodyEnvelope {
            backend: Self::BACKEND.to_string(),
            key_version: ENVELOPE_VERSION,
            public_key: BASE64.encode(verifying_key.to_bytes()),
            encrypted_private_key: BASE64.encode(&encrypted),
            encryption_nonce: BASE64.encode(nonce),
        };

        debug!(public_key = %envelope.public_key, "Generated new custodial keypair");

        Ok((verifying_key, envelope))
    }

    fn open(&self, envelope: &CustodyEnvelope) -> Result<SigningKey> {
        if envelope.backend != Self::BACKEND {
            return Err(LedgerError::Internal(format!(
                "Envelope sealed by {}, not {}",
                envelope.backend,
                Self::BACKEND
            )));
        }

        let nonce = BASE64
            .decode(&envelope.encryption_nonce)
            .map_err(|e| LedgerError::Internal(format!("Invalid nonce encoding: {e}")))?;
        let encrypted = BASE64
            .decode(&envelope.encrypted_private_key)
            .map_err(|e| LedgerError::Internal(format!("Invalid ciphertext encoding: {e}")))?;

        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| LedgerError::Internal("Invalid nonce length".into()))?;

        let private_key = decrypt_private_key(&encrypted, &self.master_key, &nonce)?;
        let signing_key = SigningKey::from_bytes(&private_key);

        if BASE64.encode(signing_key.verifying_key().to_bytes()) != envelope.public_key {
            return Err(LedgerError::Internal(
                "Envelope public key does not match sealed private key".into(),
            ));
        }

        Ok(signing_key)
    }
}
