//! Action endpoints
//!
//! ## Endpoints
//!
//! - `POST /actions` - submit an action (bearer token or `submitter`)
//! - `GET /actions` - all actions
//! - `GET /actions/pending` - actions awaiting review
//! - `GET /actions/{id}` - one action
//! - `POST /actions/{id}/prepare` - reward payload for an approval
//! - `POST /actions/{id}/finalize` - record the minting receipt
//! - `POST /actions/{id}/reject` - reject
//! - `POST /actions/{id}/reset` - administrative reset
//! - `GET /notifications?identity=` - actions whose reward goes to an identity
//!
//! Reviewers name themselves in the body (`callerIdentity` / `adminIdentity`);
//! the ledger's authorization guard decides whether that identity may act.

use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{bearer_token, json_response, query_param, read_json, FullBody};
use crate::identity::Identity;
use crate::ledger::{ActionStatus, FinalizeOutcome, RejectOutcome};
use crate::server::AppState;
use crate::types::{LedgerError, Result};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitActionRequest {
    /// Email or wallet; ignored when a bearer token is presented
    #[serde(default)]
    pub submitter: Option<String>,
    pub event_id: String,
    #[serde(default)]
    pub action_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrepareApprovalRequest {
    pub caller_identity: String,
    pub action_key: String,
    #[serde(default)]
    pub bonus: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FinalizeRequest {
    pub caller_identity: String,
    pub receipt: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RejectRequest {
    pub caller_identity: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResetRequest {
    pub admin_identity: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub id: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /actions
pub async fn handle_submit<B>(state: &AppState, req: Request<B>) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let token = bearer_token(&req);
    let request: SubmitActionRequest = read_json(req).await?;

    let submitter = match token {
        Some(token) => {
            let verifier = state.verifier.as_ref().ok_or_else(|| {
                LedgerError::InvalidToken("No identity verifier configured".into())
            })?;
            Identity::Email(verifier.verify(&token).await?)
        }
        None => {
            let raw = request
                .submitter
                .as_deref()
                .ok_or_else(|| LedgerError::BadRequest("submitter is required".into()))?;
            Identity::parse(raw)?
        }
    };

    let action = state
        .ledger
        .submit(&submitter, &request.event_id, request.action_key.as_deref())
        .await?;

    info!(
        action_id = %action.id,
        event_id = %action.event_id,
        submitter = %action.submitter_display,
        "Action submitted"
    );

    Ok(json_response(
        StatusCode::CREATED,
        &TransitionResponse {
            id: action.id,
            status: action.status,
            outcome: None,
        },
    ))
}

/// GET /actions
pub async fn handle_list_actions(state: &AppState) -> Result<Response<FullBody>> {
    let actions = state.ledger.list_all().await?;
    Ok(json_response(StatusCode::OK, &actions))
}

/// GET /actions/pending
pub async fn handle_list_pending(state: &AppState) -> Result<Response<FullBody>> {
    let actions = state.ledger.list_pending().await?;
    Ok(json_response(StatusCode::OK, &actions))
}

/// GET /actions/{id}
pub async fn handle_get_action(state: &AppState, action_id: &str) -> Result<Response<FullBody>> {
    let action = state.ledger.get(action_id).await?;
    Ok(json_response(StatusCode::OK, &action))
}

/// POST /actions/{id}/prepare
pub async fn handle_prepare<B>(
    state: &AppState,
    action_id: &str,
    req: Request<B>,
) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: PrepareApprovalRequest = read_json(req).await?;
    let payload = state
        .ledger
        .prepare_approval(
            &request.caller_identity,
            action_id,
            &request.action_key,
            request.bonus,
        )
        .await?;
    Ok(json_response(StatusCode::OK, &payload))
}

/// POST /actions/{id}/finalize
pub async fn handle_finalize<B>(
    state: &AppState,
    action_id: &str,
    req: Request<B>,
) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: FinalizeRequest = read_json(req).await?;
    let (action, outcome) = state
        .ledger
        .finalize(&request.caller_identity, action_id, request.receipt)
        .await?;

    let outcome = match outcome {
        FinalizeOutcome::Finalized => "finalized",
        FinalizeOutcome::AlreadyFinalized => "already_finalized",
    };
    Ok(json_response(
        StatusCode::OK,
        &TransitionResponse {
            id: action.id,
            status: action.status,
            outcome: Some(outcome),
        },
    ))
}

/// POST /actions/{id}/reject
pub async fn handle_reject<B>(
    state: &AppState,
    action_id: &str,
    req: Request<B>,
) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: RejectRequest = read_json(req).await?;
    let (action, outcome) = state
        .ledger
        .reject(&request.caller_identity, action_id)
        .await?;

    let outcome = match outcome {
        RejectOutcome::Rejected => "rejected",
        RejectOutcome::AlreadyRejected => "already_rejected",
    };
    Ok(json_response(
        StatusCode::OK,
        &TransitionResponse {
            id: action.id,
            status: action.status,
            outcome: Some(outcome),
        },
    ))
}

/// POST /actions/{id}/reset
pub async fn handle_reset<B>(
    state: &AppState,
    action_id: &str,
    req: Request<B>,
) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let request: ResetRequest = read_json(req).await?;
    let action = state.ledger.reset(&request.admin_identity, action_id).await?;
    Ok(json_response(
        StatusCode::OK,
        &TransitionResponse {
            id: action.id,
            status: action.status,
            outcome: None,
        },
    ))
}

/// GET /notifications?identity=
pub async fn handle_notifications<B>(state: &AppState, req: Request<B>) -> Result<Response<FullBody>> {
    let raw = query_param(&req, "identity")
        .ok_or_else(|| LedgerError::BadRequest("identity query parameter is required".into()))?;
    let identity = Identity::parse(&raw)?;
    let actions = state.ledger.list_by_recipient(&identity).await?;
    Ok(json_response(StatusCode::OK, &actions))
}
