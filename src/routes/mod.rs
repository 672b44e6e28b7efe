//! HTTP routes for the reputation ledger
//!
//! Handlers take any request body so they can be driven from tests without
//! a socket. Each returns `Result<Response>`; the router turns a
//! [`LedgerError`] into a `{"error", "code"}` body.

pub mod actions;
pub mod health;
pub mod identity;
pub mod registry;

pub use actions::{
    handle_finalize, handle_get_action, handle_list_actions, handle_list_pending,
    handle_notifications, handle_prepare, handle_reject, handle_reset, handle_submit,
};
pub use health::health_check;
pub use identity::{handle_export, handle_login, handle_resolve_identity};
pub use registry::{handle_list_events, handle_list_schema};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::types::{LedgerError, Result};

pub type FullBody = Full<Bytes>;

/// Serialize `body` as a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    with_json_headers(status, json)
}

/// Render a ledger error. Operational failures are logged as alerts.
pub fn error_response(err: LedgerError) -> Response<FullBody> {
    if err.is_operational() {
        error!(code = err.code(), "Operational failure: {}", err);
    } else {
        debug!(code = err.code(), "Request failed: {}", err);
    }
    let (status, body) = err.into_status_code_and_body();
    with_json_headers(status, body)
}

/// Not found response for unknown routes
pub fn not_found_response(path: &str) -> Response<FullBody> {
    let body = serde_json::json!({
        "error": format!("No route for {}", path),
        "code": "NOT_FOUND",
    });
    with_json_headers(StatusCode::NOT_FOUND, body.to_string())
}

/// CORS preflight response
pub fn preflight_response() -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

fn with_json_headers(status: StatusCode, json: String) -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// Collect the request body and parse it as `T`
pub async fn read_json<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: std::fmt::Display,
{
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| LedgerError::BadRequest(format!("Invalid body: {}", e)))?
        .to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

/// Bearer token from the `Authorization` header, if any
pub fn bearer_token<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(crate::auth::extract_bearer_token)
        .map(str::to_string)
}

/// Value of one query string parameter
pub fn query_param<B>(req: &Request<B>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
