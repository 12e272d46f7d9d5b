//! Request-side inputs of the tracking pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::principal::Principal;

/// Describes the handler that completed a tracked action.
///
/// Neither field is validated: an empty resource or action yields a malformed
/// event type such as `"_create"` rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedAction {
    pub resource: String,
    pub action: String,
}

impl TrackedAction {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Returns the event type label, `"<resource>_<action>"`.
    pub fn event_type(&self) -> String {
        format!("{}_{}", self.resource, self.action)
    }
}

impl fmt::Display for TrackedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.action)
    }
}

/// Outcome of a completed handler: HTTP status plus the response payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub status: u16,
    pub data: Value,
}

impl ActionResult {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }

    /// Only outcomes in the 200-299 range are tracked.
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Per-request context: who acted and from where.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub principal: Principal,
    /// Best-effort client address as resolved from the request.
    pub client_ip: Option<ClientAddr>,
}

impl RequestContext {
    pub fn new(principal: Principal, client_ip: Option<ClientAddr>) -> Self {
        Self {
            principal,
            client_ip,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// A client address and whether it is publicly routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr {
    pub ip: std::net::IpAddr,
    pub routable: bool,
}

impl ClientAddr {
    pub fn new(ip: std::net::IpAddr, routable: bool) -> Self {
        Self { ip, routable }
    }
}
