//! axum integration for the event relay.
//!
//! Host applications wrap tracked routes with [`tracked`], return
//! [`Tracked`] from their handlers and insert a [`relay_core::Principal`]
//! request extension from their auth layer.

pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use middleware::auth::require_relay_token;
pub use middleware::track::track_events;
pub use response::{ApiError, Tracked, TrackedPayload};
pub use routes::{router, tracked};
pub use state::AppState;
