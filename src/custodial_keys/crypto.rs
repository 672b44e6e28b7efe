//! Cryptographic primitives for custodial wallets.
//!
//! # Algorithms
//!
//! - **Key Generation**: Ed25519
//! - **Address Derivation**: first 20 bytes of SHA-256 over the public key
//! - **Encryption**: ChaCha20-Poly1305 under the custody master key

use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::identity::WalletAddress;
use crate::types::{LedgerError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_LEN: usize = 12;

/// Ed25519 private key length (32 bytes)
pub const PRIVATE_KEY_LEN: usize = 32;

/// Master key length (32 bytes)
pub const MASTER_KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 auth tag length (16 bytes)
pub const AUTH_TAG_LEN: usize = 16;

/// Bytes of the public key digest that make up an address
pub const ADDRESS_LEN: usize = 20;

// =============================================================================
// Key Generation
// =============================================================================

/// Generate a new Ed25519 signing keypair from the OS RNG.
pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Generate cryptographically secure random bytes.
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Derive the wallet address that identifies a custodial keypair.
pub fn derive_address(verifying_key: &VerifyingKey) -> WalletAddress {
    let digest = Sha256::digest(verifying_key.as_bytes());
    WalletAddress::from_bytes(&digest[..ADDRESS_LEN])
}

/// Parse a hex-encoded 32-byte master key from configuration.
pub fn parse_master_key(hex_key: &str) -> Result<Zeroizing<[u8; MASTER_KEY_LEN]>> {
    let decoded = Zeroizing::new(
        hex::decode(hex_key.trim())
            .map_err(|e| LedgerError::Config(format!("Custody master key is not hex: {e}")))?,
    );

    if decoded.len() != MASTER_KEY_LEN {
        return Err(LedgerError::Config(format!(
            "Custody master key must be {} bytes, got {}",
            MASTER_KEY_LEN,
            decoded.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; MASTER_KEY_LEN]);
    key.copy_from_slice(&decoded);
    Ok(key)
}

// =============================================================================
// Encryption / Decryption
// =============================================================================

/// Encrypt a private key using ChaCha20-Poly1305.
///
/// Returns 48 bytes: the encrypted key followed by the auth tag.
/// A nonce must never be reused with the same master key.
pub fn encrypt_private_key(
    private_key: &[u8; PRIVATE_KEY_LEN],
    master_key: &[u8; MASTER_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(master_key));
    cipher
        .encrypt(Nonce::from_slice(nonce), private_key.as_slice())
        .map_err(|e| LedgerError::Internal(format!("Encryption failed: {e}")))
}

/// Decrypt a private key using ChaCha20-Poly1305.
///
/// Fails when the ciphertext was tampered with or the master key differs
/// from the one it was sealed under.
pub fn decrypt_private_key(
    ciphertext: &[u8],
    master_key: &[u8; MASTER_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Zeroizing<[u8; PRIVATE_KEY_LEN]>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(master_key));
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| LedgerError::Internal("Failed to open custodial key".into()))?,
    );

    if plaintext.len() != PRIVATE_KEY_LEN {
        return Err(LedgerError::Internal(format!(
            "Invalid decrypted key length: expected {}, got {}",
            PRIVATE_KEY_LEN,
            plaintext.len()
        )));
    }

    let mut key = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
    key.copy_from_slice(&plaintext);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_deterministic() {
        let (_, verifying_key) = generate_keypair();

        let first = derive_address(&verifying_key);
        let second = derive_address(&verifying_key);
        assert_eq!(first, second);
        assert!(WalletAddress::is_wallet_shaped(first.as_str()));

        let (_, other) = generate_keypair();
        assert_ne!(first, derive_address(&other));
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let master_key: [u8; MASTER_KEY_LEN] = generate_random_bytes();
        let nonce: [u8; NONCE_LEN] = generate_random_bytes();
        let (signing_key, _) = generate_keypair();
        let private_key = signing_key.to_bytes();

        let ciphertext = encrypt_private_key(&private_key, &master_key, &nonce).unwrap();
        assert_eq!(ciphertext.len(), PRIVATE_KEY_LEN + AUTH_TAG_LEN);

        let decrypted = decrypt_private_key(&ciphertext, &master_key, &nonce).unwrap();
        assert_eq!(*decrypted, private_key);
    }

    #[test]
    fn test_decrypt_with_other_master_key_fails() {
        let master_key: [u8; MASTER_KEY_LEN] = generate_random_bytes();
        let other_key: [u8; MASTER_KEY_LEN] = generate_random_bytes();
        let nonce: [u8; NONCE_LEN] = generate_random_bytes();
        let (signing_key, _) = generate_keypair();

        let ciphertext =
            encrypt_private_key(&signing_key.to_bytes(), &master_key, &nonce).unwrap();

        assert!(decrypt_private_key(&ciphertext, &other_key, &nonce).is_err());
    }

    #[test]
    fn test_parse_master_key() {
        let key = parse_master_key(&"ab".repeat(32)).unwrap();
        assert_eq!(key[0], 0xab);

        assert!(matches!(
            parse_master_key("abcd"),
            Err(LedgerError::Config(_))
        ));
        assert!(matches!(
            parse_master_key("not hex at all"),
            Err(LedgerError::Config(_))
        ));
    }
}
