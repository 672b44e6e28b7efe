//! Custodial wallets for email participants
//!
//! Participants who sign in with an email don't hold a wallet of their own.
//! The first time an email is seen, a keypair is generated on their behalf,
//! sealed by a [`KeyCustody`] backend and stored under the email. Every later
//! resolution of that email returns the same address.
//!
//! # Custody
//!
//! Private keys are never persisted in the clear:
//! - `LocalEncryptedCustody` seals keys with ChaCha20-Poly1305 under a
//!   master key from configuration
//! - Other backends (an external KMS) implement [`KeyCustody`]
//! - Sealed envelopes can be exported for migration to self-custody

pub mod crypto;
pub mod custody;
pub mod resolver;

pub use crypto::{derive_address, generate_keypair, parse_master_key};
pub use custody::{CustodyEnvelope, KeyCustody, LocalEncryptedCustody};
pub use resolver::{KeyExportFormat, WalletRecord, WalletResolver};
