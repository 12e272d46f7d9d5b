//! Relay endpoint for hosts that run out of process.
//!
//! `POST /v1/track` takes the same inputs the middleware gathers in process
//! and runs them through the tracker. The client address comes from the
//! forwarding headers of the call itself, so proxies must pass them through.

use axum::{extract::State, http::StatusCode, Json};
use relay_core::{ActionResult, Principal, RequestContext, TrackedAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extractors::ClientIp;
use crate::state::AppState;

/// One completed action reported by a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRequest {
    pub resource: String,
    pub action: String,
    /// Handler status; defaults to 200.
    #[serde(default = "default_status")]
    pub status: u16,
    pub data: Value,
    #[serde(default)]
    pub principal: Principal,
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackResponse {
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
}

/// POST /v1/track
///
/// Always answers 202: tracking failures are reported in the body, never as
/// an error status.
pub async fn track_handler(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<TrackRequest>,
) -> (StatusCode, Json<TrackResponse>) {
    let action = TrackedAction::new(request.resource, request.action);
    let result = ActionResult::new(request.status, request.data);
    let ctx = RequestContext::new(request.principal, client_ip);

    let outcome = state.tracker.track(&result, &action, &ctx).await;

    (
        StatusCode::ACCEPTED,
        Json(TrackResponse {
            outcome: outcome.label().to_string(),
            insert_id: outcome.insert_id().map(str::to_string),
        }),
    )
}
