//! Tracking middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use relay_core::{ActionResult, Principal, RequestContext, TrackedAction};
use tracing::debug;

use crate::extractors::client_addr;
use crate::response::TrackedPayload;
use crate::state::AppState;

/// Runs the tracker after a tracked handler completes.
///
/// Needs a [`TrackedAction`] request extension (see [`crate::tracked`]) and a
/// [`TrackedPayload`] on the response; anything else passes straight through.
/// The response is returned unchanged whatever the tracker reports.
pub async fn track_events(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(action) = request.extensions().get::<TrackedAction>().cloned() else {
        return next.run(request).await;
    };

    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or_default();
    let ctx = RequestContext::new(principal, client_addr(request.headers(), request.extensions()));

    let response = next.run(request).await;

    let Some(TrackedPayload(data)) = response.extensions().get::<TrackedPayload>().cloned() else {
        debug!(action = %action, status = %response.status(), "Response carries no tracked payload");
        return response;
    };

    let result = ActionResult::new(response.status().as_u16(), data);
    let outcome = state.tracker.track(&result, &action, &ctx).await;
    debug!(action = %action, outcome = ?outcome, "Tracking complete");

    response
}
