//! Identity endpoints
//!
//! - `POST /identity/resolve` - map an email or wallet to its wallet address
//! - `POST /auth/login` - verify an ID token and resolve its email
//! - `GET /identity/export` - sealed custody envelope for the bearer's wallet

use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{bearer_token, json_response, read_json, FullBody};
use crate::identity::Identity;
use crate::server::AppState;
use crate::types::{LedgerError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolveIdentityRequest {
    pub identity: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveIdentityResponse {
    /// Normalized identity
    pub identity: String,
    pub address: String,
    /// "email" or "wallet"
    pub kind: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub email: String,
    pub address: String,
}

/// POST /identity/resolve
pub async fn handle_resolve_identity<B>(state: &AppState, req: Request<B>) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: ResolveIdentityRequest = read_json(req).await?;
    let identity = Identity::parse(&request.identity)?;
    let address = state.ledger.resolver().resolve(&identity).await?;

    Ok(json_response(
        StatusCode::OK,
        &ResolveIdentityResponse {
            identity: identity.to_string(),
            address: address.to_string(),
            kind: identity.kind(),
        },
    ))
}

/// POST /auth/login
pub async fn handle_login<B>(state: &AppState, req: Request<B>) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: LoginRequest = read_json(req).await?;
    let verifier = state
        .verifier
        .as_ref()
        .ok_or_else(|| LedgerError::InvalidToken("No identity verifier configured".into()))?;

    let email = verifier.verify(&request.token).await?;
    let address = state
        .ledger
        .resolver()
        .resolve(&Identity::Email(email.clone()))
        .await?;

    info!(email = %email, address = %address, "Login");

    Ok(json_response(
        StatusCode::OK,
        &LoginResponse {
            email: email.to_string(),
            address: address.to_string(),
        },
    ))
}

/// GET /identity/export
///
/// Only the verified owner of the email may export its wallet. The private
/// key in the response is still sealed.
pub async fn handle_export<B>(state: &AppState, req: Request<B>) -> Result<Response<FullBody>> {
    let token = bearer_token(&req)
        .ok_or_else(|| LedgerError::InvalidToken("Bearer token required".into()))?;
    let verifier = state
        .verifier
        .as_ref()
        .ok_or_else(|| LedgerError::InvalidToken("No identity verifier configured".into()))?;

    let email = verifier.verify(&token).await?;
    let export = state.ledger.resolver().export(&email).await?;
    Ok(json_response(StatusCode::OK, &export))
}
