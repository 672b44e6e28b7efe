//! Configuration for the reputation ledger
//!
//! CLI arguments and environment variable handling using clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Where action and wallet records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// Embedded sled database under DATA_DIR
    Sled,
    /// Process memory; everything is lost on exit
    Memory,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Reputation Ledger - organizer-reviewed community actions
#[derive(Parser, Debug, Clone)]
#[command(name = "reputation-ledger")]
#[command(about = "Organizer-reviewed community action ledger")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory for the sled database
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Storage backend
    #[arg(long, env = "STORE_BACKEND", value_enum, default_value = "sled")]
    pub store_backend: StoreBackend,

    /// TOML file with the schema and events (built-in defaults when unset)
    #[arg(long, env = "REGISTRY_PATH")]
    pub registry_path: Option<PathBuf>,

    /// Identity allowed to reset actions
    #[arg(long, env = "ADMIN_IDENTITY")]
    pub admin_identity: Option<String>,

    /// Hex-encoded 32-byte master key sealing custodial private keys
    /// (required in production)
    #[arg(long, env = "CUSTODY_MASTER_KEY", hide_env_values = true)]
    pub custody_master_key: Option<String>,

    /// Shared secret for HS256 identity tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// PEM public key for RS256 identity tokens (takes precedence over JWT_SECRET)
    #[arg(long, env = "JWT_PUBLIC_KEY_PATH")]
    pub jwt_public_key_path: Option<PathBuf>,

    /// Expected `aud` claim of identity tokens
    #[arg(long, env = "JWT_AUDIENCE")]
    pub jwt_audience: Option<String>,

    /// Expected `iss` claim of identity tokens
    #[arg(long, env = "JWT_ISSUER")]
    pub jwt_issuer: Option<String>,

    /// Append audit records to this JSONL file
    #[arg(long, env = "AUDIT_LOG_PATH")]
    pub audit_log_path: Option<PathBuf>,

    /// Enable development mode (insecure custody key, optional token verifier)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

impl Args {
    /// Whether any identity token verifier is configured
    pub fn has_verifier(&self) -> bool {
        self.jwt_secret.is_some() || self.jwt_public_key_path.is_some()
    }

    /// Path of the sled database
    pub fn sled_path(&self) -> PathBuf {
        self.data_dir.join("ledger.sled")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.custody_master_key.is_none() {
                return Err("CUSTODY_MASTER_KEY is required in production mode".to_string());
            }
            if !self.has_verifier() {
                return Err(
                    "JWT_SECRET or JWT_PUBLIC_KEY_PATH is required in production mode".to_string(),
                );
            }
            if self.store_backend == StoreBackend::Memory {
                return Err("STORE_BACKEND=memory is only allowed in dev mode".to_string());
            }
        }

        if let Some(ref issuer) = self.jwt_issuer {
            url::Url::parse(issuer).map_err(|e| format!("JWT_ISSUER is not a URL: {}", e))?;
        }

        if self
            .admin_identity
            .as_deref()
            .is_some_and(|admin| admin.trim().is_empty())
        {
            return Err("ADMIN_IDENTITY must not be blank".to_string());
        }

        Ok(())
    }
}
