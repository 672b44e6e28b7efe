//! Wallet Identity Resolver
//!
//! Maps participant identities to wallet addresses.
//!
//! # Responsibilities
//!
//! - Pass wallet identities through untouched
//! - Get-or-create a custodial wallet for every email, exactly once
//! - Export sealed key material for migration to self-custody

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::crypto::derive_address;
use super::custody::{CustodyEnvelope, KeyCustody};
use crate::db::{self, KvStore, WALLET_PREFIX};
use crate::identity::{EmailIdentity, Identity, WalletAddress};
use crate::types::{LedgerError, Result};

// =============================================================================
// Records
// =============================================================================

/// Durable mapping from an email to its custodial wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub identity: EmailIdentity,
    pub address: WalletAddress,
    pub custody: CustodyEnvelope,
    pub created_at: DateTime<Utc>,
}

/// Export format for migrating a custodial wallet to self-custody.
///
/// The private key stays sealed; only the custody backend can open it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExportFormat {
    /// Version of the export format
    pub version: u32,
    pub identity: String,
    pub address: String,
    pub custody: CustodyEnvelope,
    pub exported_at: String,
}

fn wallet_key(identity: &EmailIdentity) -> String {
    format!("{}{}", WALLET_PREFIX, identity)
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves identities to wallet addresses, creating custodial wallets on
/// first sight of an email.
pub struct WalletResolver {
    store: Arc<dyn KvStore>,
    custody: Arc<dyn KeyCustody>,
}

impl WalletResolver {
    pub fn new(store: Arc<dyn KvStore>, custody: Arc<dyn KeyCustody>) -> Self {
        Self { store, custody }
    }

    /// Classify a raw identity string and resolve it
    pub async fn resolve_str(&self, raw: &str) -> Result<WalletAddress> {
        self.resolve(&Identity::parse(raw)?).await
    }

    /// Resolve an identity to its wallet address, creating a custodial
    /// wallet for an email seen for the first time.
    pub async fn resolve(&self, identity: &Identity) -> Result<WalletAddress> {
        let email = match identity {
            Identity::Wallet(address) => return Ok(address.clone()),
            Identity::Email(email) => email,
        };

        if let Some(record) = self.record(email).await? {
            return Ok(record.address);
        }

        let (verifying_key, custody) = self.custody.generate()?;
        let record = WalletRecord {
            identity: email.clone(),
            address: derive_address(&verifying_key),
            custody,
            created_at: Utc::now(),
        };

        let key = wallet_key(email);
        match self.store.insert_if_absent(&key, db::encode(&record)?).await? {
            None => {
                info!(
                    identity = %email,
                    address = %record.address,
                    backend = self.custody.backend(),
                    "Created custodial wallet"
                );
                Ok(record.address)
            }
            Some(existing) => {
                // Lost the creation race; the winner's wallet is the wallet
                let existing: WalletRecord = db::decode(&existing)?;
                debug!(
                    identity = %email,
                    address = %existing.address,
                    "Custodial wallet created concurrently, using existing"
                );
                Ok(existing.address)
            }
        }
    }

    /// Resolve without creating anything. An email with no wallet yet
    /// resolves to `None`.
    pub async fn lookup(&self, identity: &Identity) -> Result<Option<WalletAddress>> {
        match identity {
            Identity::Wallet(address) => Ok(Some(address.clone())),
            Identity::Email(email) => Ok(self.record(email).await?.map(|r| r.address)),
        }
    }

    /// Fetch the stored wallet record for an email
    pub async fn record(&self, email: &EmailIdentity) -> Result<Option<WalletRecord>> {
        match self.store.get(&wallet_key(email)).await? {
            Some(bytes) => Ok(Some(db::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Export sealed key material for an email's custodial wallet
    pub async fn export(&self, email: &EmailIdentity) -> Result<KeyExportFormat> {
        let record = self
            .record(email)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("No custodial wallet for {}", email)))?;

        info!(
            identity = %email,
            address = %record.address,
            "Exported custodial wallet"
        );

        Ok(KeyExportFormat {
            version: 1,
            identity: record.identity.to_string(),
            address: record.address.to_string(),
            custody: record.custody,
            exported_at: Utc::now().to_rfc3339(),
        })
    }

    /// Number of custodial wallets in the store
    pub async fn wallet_count(&self) -> Result<usize> {
        Ok(self.store.scan_prefix(WALLET_PREFIX).await?.len())
    }
}
