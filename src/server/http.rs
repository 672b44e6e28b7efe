//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::IdentityVerifier;
use crate::config::Args;
use crate::ledger::ActionLedger;
use crate::routes::{self, error_response, not_found_response, preflight_response, FullBody};
use crate::types::LedgerError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub ledger: Arc<ActionLedger>,
    /// Identity token verifier; without one, bearer tokens are refused
    pub verifier: Option<Arc<dyn IdentityVerifier>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        ledger: Arc<ActionLedger>,
        verifier: Option<Arc<dyn IdentityVerifier>>,
    ) -> Self {
        Self {
            args,
            ledger,
            verifier,
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), LedgerError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Reputation ledger listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - custody key may be insecure");
    }
    if state.verifier.is_none() {
        warn!("No identity verifier configured - bearer tokens will be refused");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<FullBody>, Infallible> {
    debug!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(&state, req).await)
}

/// Route a request to its handler
pub async fn route<B>(state: &AppState, req: Request<B>) -> Response<FullBody>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let result = match (&method, segments.as_slice()) {
        (&Method::OPTIONS, _) => return preflight_response(),

        (&Method::GET, ["health"]) => return routes::health_check(state).await,

        // Identity
        (&Method::POST, ["identity", "resolve"]) => routes::handle_resolve_identity(state, req).await,
        (&Method::GET, ["identity", "export"]) => routes::handle_export(state, req).await,
        (&Method::POST, ["auth", "login"]) => routes::handle_login(state, req).await,

        // Registry
        (&Method::GET, ["schema"]) => return routes::handle_list_schema(state),
        (&Method::GET, ["events"]) => return routes::handle_list_events(state),

        // Actions
        (&Method::POST, ["actions"]) => routes::handle_submit(state, req).await,
        (&Method::GET, ["actions"]) => routes::handle_list_actions(state).await,
        (&Method::GET, ["actions", "pending"]) => routes::handle_list_pending(state).await,
        (&Method::GET, ["actions", id]) => routes::handle_get_action(state, id).await,
        (&Method::POST, ["actions", id, "prepare"]) => routes::handle_prepare(state, id, req).await,
        (&Method::POST, ["actions", id, "finalize"]) => {
            routes::handle_finalize(state, id, req).await
        }
        (&Method::POST, ["actions", id, "reject"]) => routes::handle_reject(state, id, req).await,
        (&Method::POST, ["actions", id, "reset"]) => routes::handle_reset(state, id, req).await,

        (&Method::GET, ["notifications"]) => routes::handle_notifications(state, req).await,

        _ => return not_found_response(&path),
    };

    result.unwrap_or_else(error_response)
}
