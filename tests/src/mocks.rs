//! Mock implementations for testing.

use async_trait::async_trait;
use forwarder::{EventSink, ForwardOutcome};
use geoip::{GeoIpError, GeoLocation, GeoLookup};
use parking_lot::Mutex;
use relay_core::error::DeliveryErrorCode;
use relay_core::{Error, Result};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// How the mock endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Respond with this status code.
    Status(u16),
    /// Fail as if the endpoint were unreachable.
    Unreachable,
}

/// Mock sink that captures hits in memory.
///
/// Implements the same `EventSink` trait as the real `HttpForwarder`, so the
/// tests exercise every production code path except the network transport.
#[derive(Clone)]
pub struct MockSink {
    hits: Arc<Mutex<Vec<String>>>,
    mode: Arc<Mutex<SinkMode>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(Mutex::new(Vec::new())),
            mode: Arc::new(Mutex::new(SinkMode::Status(200))),
        }
    }

    /// Hits parsed as JSON.
    pub fn hits(&self) -> Vec<serde_json::Value> {
        self.hits
            .lock()
            .iter()
            .map(|h| serde_json::from_str(h).expect("hit is valid JSON"))
            .collect()
    }

    /// The single event of every hit.
    pub fn events(&self) -> Vec<serde_json::Value> {
        self.hits()
            .into_iter()
            .map(|mut hit| hit["events"][0].take())
            .collect()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().len()
    }

    pub fn clear(&self) {
        self.hits.lock().clear();
    }

    pub fn set_mode(&self, mode: SinkMode) {
        *self.mode.lock() = mode;
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for MockSink {
    async fn forward(&self, hit: &str) -> Result<ForwardOutcome> {
        self.hits.lock().push(hit.to_string());

        match *self.mode.lock() {
            SinkMode::Status(status) if (200..300).contains(&status) => {
                Ok(ForwardOutcome::Delivered { status })
            }
            SinkMode::Status(status) => Ok(ForwardOutcome::Rejected {
                status,
                body: format!("{{\"code\":{status}}}"),
            }),
            SinkMode::Unreachable => Err(Error::delivery(
                DeliveryErrorCode::Transport,
                "connection refused",
                None,
            )),
        }
    }
}

/// In-memory GeoIP table.
#[derive(Default)]
pub struct FakeGeo {
    table: HashMap<IpAddr, GeoLocation>,
}

impl FakeGeo {
    pub fn with(mut self, ip: &str, location: GeoLocation) -> Self {
        self.table
            .insert(ip.parse().expect("valid ip"), location);
        self
    }
}

impl GeoLookup for FakeGeo {
    fn lookup(&self, ip: IpAddr) -> geoip::Result<GeoLocation> {
        self.table
            .get(&ip)
            .cloned()
            .ok_or(GeoIpError::AddressNotFound(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_sink_captures_hits() {
        let sink = MockSink::new();
        let outcome = sink.forward(r#"{"api_key":"k","events":[{"id":1}]}"#).await.unwrap();
        assert!(outcome.is_delivered());
        assert_eq!(sink.hit_count(), 1);
        assert_eq!(sink.events()[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_mock_sink_modes() {
        let sink = MockSink::new();

        sink.set_mode(SinkMode::Status(503));
        let outcome = sink.forward("{}").await.unwrap();
        assert_eq!(outcome.status(), 503);

        sink.set_mode(SinkMode::Unreachable);
        assert!(sink.forward("{}").await.is_err());
        assert_eq!(sink.hit_count(), 2);
    }
}
