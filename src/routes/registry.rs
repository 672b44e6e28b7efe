//! Read-only registry endpoints

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::{json_response, FullBody};
use crate::registry::{ActionKind, Event};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse<'a> {
    pub community_id: &'a str,
    pub schema_id: &'a str,
    pub version: u32,
    pub actions: &'a [ActionKind],
}

/// GET /schema
pub fn handle_list_schema(state: &AppState) -> Response<FullBody> {
    let schema = &state.ledger.registry().schema;
    json_response(
        StatusCode::OK,
        &SchemaResponse {
            community_id: schema.community_id(),
            schema_id: schema.schema_id(),
            version: schema.version(),
            actions: schema.list(),
        },
    )
}

/// GET /events
pub fn handle_list_events(state: &AppState) -> Response<FullBody> {
    let events: &[Event] = state.ledger.registry().events.list();
    json_response(StatusCode::OK, &events)
}
