//! Request extractors.

use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
};
use relay_core::ClientAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolves the client address of a request.
///
/// Candidates, in order: every `X-Forwarded-For` hop left to right,
/// `X-Real-IP`, then the socket peer when the server was started with
/// connect info.
pub fn client_addr(headers: &HeaderMap, extensions: &Extensions) -> Option<ClientAddr> {
    let mut candidates: Vec<String> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|hop| hop.trim().to_string())
        .collect();

    if let Some(real_ip) = headers.get(X_REAL_IP).and_then(|v| v.to_str().ok()) {
        candidates.push(real_ip.trim().to_string());
    }

    if let Some(ConnectInfo(peer)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        candidates.push(peer.ip().to_string());
    }

    geoip::resolve_client_addr(candidates.iter().map(String::as_str))
}

/// Client address, when one could be determined.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<ClientAddr>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_addr(&parts.headers, &parts.extensions)))
    }
}
