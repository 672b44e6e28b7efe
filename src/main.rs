//! Reputation Ledger server

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reputation_ledger::{
    auth::{IdentityVerifier, JwtIdentityVerifier},
    config::{Args, LogFormat, StoreBackend},
    custodial_keys::{parse_master_key, KeyCustody, LocalEncryptedCustody, WalletResolver},
    db::{KvStore, MemoryStore, SledStore},
    logging::AuditLog,
    registry::Registry,
    server, ActionLedger,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("reputation_ledger={},info", args.log_level).into());
    match args.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Reputation Ledger");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Store: {:?}", args.store_backend);
    info!(
        "Admin: {}",
        args.admin_identity.as_deref().unwrap_or("(none, resets disabled)")
    );
    info!("======================================");

    let registry = match args.registry_path {
        Some(ref path) => Registry::load(path)?,
        None => {
            info!("No REGISTRY_PATH set, using built-in registry");
            Registry::builtin()?
        }
    };

    let store: Arc<dyn KvStore> = match args.store_backend {
        StoreBackend::Sled => {
            let path = args.sled_path();
            std::fs::create_dir_all(&args.data_dir)
                .with_context(|| format!("creating {}", args.data_dir.display()))?;
            info!("Opening sled store at {}", path.display());
            Arc::new(SledStore::open(&path)?)
        }
        StoreBackend::Memory => {
            warn!("In-memory store: all actions and wallets are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let custody: Arc<dyn KeyCustody> = match args.custody_master_key {
        Some(ref hex_key) => Arc::new(LocalEncryptedCustody::new(parse_master_key(hex_key)?)),
        None => {
            warn!("CUSTODY_MASTER_KEY not set - sealing custodial keys with the insecure dev key");
            Arc::new(LocalEncryptedCustody::insecure_dev())
        }
    };

    let verifier = if let Some(ref path) = args.jwt_public_key_path {
        let pem = std::fs::read(path)
            .with_context(|| format!("reading JWT public key {}", path.display()))?;
        Some(JwtIdentityVerifier::rs256_pem(
            &pem,
            args.jwt_audience.as_deref(),
            args.jwt_issuer.as_deref(),
        )?)
    } else if let Some(ref secret) = args.jwt_secret {
        Some(JwtIdentityVerifier::hs256(
            secret,
            args.jwt_audience.as_deref(),
            args.jwt_issuer.as_deref(),
        )?)
    } else {
        None
    };
    let verifier = verifier.map(|v| Arc::new(v) as Arc<dyn IdentityVerifier>);

    let audit = AuditLog::new();
    if let Some(ref path) = args.audit_log_path {
        audit
            .init_file(path.clone())
            .with_context(|| format!("opening audit log {}", path.display()))?;
    }

    let resolver = Arc::new(WalletResolver::new(Arc::clone(&store), custody));
    let ledger = ActionLedger::new(
        store,
        Arc::new(registry),
        resolver,
        args.admin_identity.clone(),
    )
    .with_audit(audit);

    let state = Arc::new(server::AppState::new(args, Arc::new(ledger), verifier));
    server::run(state).await?;

    Ok(())
}
