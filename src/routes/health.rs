//! Health check endpoint
//!
//! `GET /health` returns 200 while the process is up. `degraded` means the
//! store could not be read.

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use super::{json_response, FullBody};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "online" or "degraded"
    pub status: &'static str,
    pub version: &'static str,
    /// "development" or "production"
    pub mode: &'static str,
    pub uptime: u64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallets: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
pub async fn health_check(state: &AppState) -> Response<FullBody> {
    let (status, wallets, error) = match state.ledger.resolver().wallet_count().await {
        Ok(count) => ("online", Some(count), None),
        Err(e) => {
            warn!("Health check could not read store: {}", e);
            ("degraded", None, Some(e.to_string()))
        }
    };

    json_response(
        StatusCode::OK,
        &HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            mode: if state.args.dev_mode {
                "development"
            } else {
                "production"
            },
            uptime: state.started_at.elapsed().as_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            wallets,
            error,
        },
    )
}
