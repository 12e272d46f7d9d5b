//! API routes.

pub mod health;
pub mod track;

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Extension, Router,
};
use relay_core::TrackedAction;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{auth::require_relay_token, track::track_events};
use crate::state::AppState;

/// Creates the service router: the relay endpoint, health endpoints and the
/// standard layers.
///
/// `/v1/track` sits behind [`require_relay_token`].
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/v1/track",
            post(track::track_handler).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_relay_token,
            )),
        )
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Marks a route as tracked.
///
/// Attaches `action` as a request extension and wraps the route in
/// [`track_events`]. The extension layer sits outside the middleware so the
/// action is visible before the handler runs.
pub fn tracked<S>(route: MethodRouter<S>, action: TrackedAction, state: AppState) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route
        .layer::<_, std::convert::Infallible>(middleware::from_fn_with_state(state, track_events))
        .layer::<_, std::convert::Infallible>(Extension(action))
}
