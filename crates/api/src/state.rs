//! Application state shared across handlers and middleware.

use std::sync::Arc;

use pipeline::Tracker;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Post-processing hook run after every tracked handler
    pub tracker: Arc<Tracker>,
    /// Shared secret for `/v1/track`; the endpoint refuses every caller when unset
    pub relay_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self {
            tracker,
            relay_token: None,
        }
    }

    /// Sets the relay token. Blank tokens leave the endpoint closed.
    pub fn with_relay_token(mut self, token: Option<&str>) -> Self {
        self.relay_token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Arc::from);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tracker", &self.tracker)
            .field("relay_token", &self.relay_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
