//! Participant identities
//!
//! A caller is either an email (a durable external identity that gets a
//! custodial wallet) or a raw wallet address. The distinction is made once,
//! here, when a string enters the system.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{LedgerError, Result};

/// Number of hex digits in a wallet address (after the `0x` prefix)
pub const WALLET_HEX_LEN: usize = 40;

/// Display marker recorded for submissions made directly from a wallet
pub const DIRECT_WALLET_MARKER: &str = "direct wallet";

/// A `0x`-prefixed, 40 hex digit wallet address.
///
/// The original casing is preserved; addresses have no canonical case, so
/// equality is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse a wallet address, rejecting anything not wallet-shaped
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if Self::is_wallet_shaped(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(LedgerError::BadRequest(format!(
                "Not a wallet address: {}",
                raw
            )))
        }
    }

    /// Whether `raw` looks like `0x` followed by 40 hex digits
    pub fn is_wallet_shaped(raw: &str) -> bool {
        let Some(hex_part) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) else {
            return false;
        };
        hex_part.len() == WALLET_HEX_LEN && hex_part.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Build an address from raw bytes (custodial wallets)
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against any identity string
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq for WalletAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for WalletAddress {}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized (trimmed, lower-cased) email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailIdentity(String);

impl EmailIdentity {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        match normalized.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalized.chars().any(char::is_whitespace) =>
            {
                Ok(Self(normalized))
            }
            _ => Err(LedgerError::BadRequest(format!(
                "Not an email address: {}",
                raw
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a participant, decided once at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identity {
    Email(EmailIdentity),
    Wallet(WalletAddress),
}

impl Identity {
    /// Classify a raw identity string
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::BadRequest("Identity is empty".into()));
        }
        if WalletAddress::is_wallet_shaped(trimmed) {
            return Ok(Self::Wallet(WalletAddress(trimmed.to_string())));
        }
        EmailIdentity::parse(trimmed).map(Self::Email)
    }

    /// What gets recorded as the submitter's display identity
    pub fn display(&self) -> String {
        match self {
            Self::Email(email) => email.to_string(),
            Self::Wallet(_) => DIRECT_WALLET_MARKER.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Wallet(_) => "wallet",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(email) => email.fmt(f),
            Self::Wallet(address) => address.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xCB7823F557E49fd23C70C27fa7739D8e695561B6";

    #[test]
    fn test_wallet_classification() {
        let identity = Identity::parse(ADDR).unwrap();
        assert_eq!(identity.kind(), "wallet");
        // Kept as given
        assert_eq!(identity.to_string(), ADDR);
        assert_eq!(identity.display(), DIRECT_WALLET_MARKER);
    }

    #[test]
    fn test_email_is_normalized() {
        let identity = Identity::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(identity, Identity::Email(EmailIdentity("alice@example.com".into())));
        assert_eq!(identity.display(), "alice@example.com");
    }

    #[test]
    fn test_malformed_identities_rejected() {
        for raw in ["", "   ", "alice", "@example.com", "alice@", "a@b@c", "a b@c.d"] {
            assert!(
                matches!(Identity::parse(raw), Err(LedgerError::BadRequest(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_near_wallet_strings_are_not_wallets() {
        // Too short, and a non-hex digit
        assert!(!WalletAddress::is_wallet_shaped("0x1234"));
        assert!(!WalletAddress::is_wallet_shaped(
            "0xZZ7823F557E49fd23C70C27fa7739D8e695561B6"
        ));
        assert!(WalletAddress::parse("0xANOTHER_ORGANIZER_ADDRESS").is_err());
    }

    #[test]
    fn test_address_equality_ignores_case() {
        let upper = WalletAddress::parse(ADDR).unwrap();
        let lower = WalletAddress::parse(&ADDR.to_lowercase()).unwrap();
        assert_eq!(upper, lower);
        assert!(upper.matches(&ADDR.to_uppercase().replace("0X", "0x")));
    }

    #[test]
    fn test_from_bytes_is_wallet_shaped() {
        let address = WalletAddress::from_bytes(&[0xab; 20]);
        assert!(WalletAddress::is_wallet_shaped(address.as_str()));
    }
}
