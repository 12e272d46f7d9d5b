//! Fixed values shared across the relay.
//!
//! The ingestion API deduplicates on `insert_id`, so anything that feeds into
//! it (the event type separator and the stable id field) must stay stable
//! across releases.

use std::time::Duration;

// === Identity ===

/// `user_id` sent for unauthenticated principals.
pub const ANONYMOUS_USER_ID: &str = "_Anonymous_";

/// Placeholder used for both name fields of anonymous principals.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Prefix of the `user_id` sent for authenticated principals.
pub const USER_ID_PREFIX: &str = "user: ";

// === Payload ===

/// Payload field carrying the record's stable identifier.
pub const STABLE_ID_FIELD: &str = "id";

// === Ingestion ===

/// Default analytics ingestion endpoint (HTTP API v2).
pub const DEFAULT_INGESTION_URL: &str = "https://api.amplitude.com/2/httpapi";

/// Default timeout for one forwarding attempt.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound accepted for a configured forwarding timeout (ms).
pub const MAX_FORWARD_TIMEOUT_MS: u64 = 30_000;

/// Maximum response body length kept in logs for rejected deliveries.
pub const MAX_LOGGED_BODY_BYTES: usize = 2048;
