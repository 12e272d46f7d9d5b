//! Authentication middleware for the relay endpoint.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::response::ApiError;
use crate::state::AppState;

const X_API_KEY: &str = "x-api-key";

/// Requires the configured relay token as `Authorization: Bearer <token>`
/// or `X-API-Key: <token>`.
///
/// With no token configured every request is refused.
pub async fn require_relay_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.relay_token.as_deref() else {
        warn!("Relay request refused, no relay token configured");
        return Err(ApiError::unauthorized("relay endpoint is not enabled"));
    };

    let Some(presented) = presented_token(request.headers()) else {
        warn!("Relay request missing credentials");
        return Err(ApiError::unauthorized("missing relay token"));
    };

    if !tokens_match(expected.as_bytes(), presented.as_bytes()) {
        warn!("Relay request with invalid token");
        return Err(ApiError::unauthorized("invalid relay token"));
    }

    Ok(next.run(request).await)
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth) = headers.get(AUTHORIZATION) {
        return auth.to_str().ok()?.strip_prefix("Bearer ");
    }
    headers.get(X_API_KEY)?.to_str().ok()
}

fn tokens_match(expected: &[u8], presented: &[u8]) -> bool {
    if expected.len() != presented.len() {
        return false;
    }
    expected.ct_eq(presented).into()
}
