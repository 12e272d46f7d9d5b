//! Event sinks: the HTTP forwarder and the trait it sits behind.

use std::time::Instant;

use async_trait::async_trait;
use relay_core::error::DeliveryErrorCode;
use relay_core::limits::MAX_LOGGED_BODY_BYTES;
use relay_core::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use telemetry::{health, metrics};
use tracing::{debug, info};

use crate::config::ForwarderConfig;

/// How the ingestion endpoint answered one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// 2xx response.
    Delivered { status: u16 },
    /// Any other response; the body is kept (truncated) for the logs.
    Rejected { status: u16, body: String },
}

impl ForwardOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Delivered { status } | Self::Rejected { status, .. } => *status,
        }
    }
}

/// Destination for serialized ingestion payloads.
///
/// The HTTP forwarder in production, a capturing mock in tests.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one serialized payload. Exactly one attempt, no retry.
    ///
    /// `Err` means the request never produced a response (connect failure,
    /// timeout); a response of any status is an `Ok` outcome.
    async fn forward(&self, hit: &str) -> Result<ForwardOutcome>;
}

/// Forwards payloads to the ingestion endpoint over HTTP.
#[derive(Clone)]
pub struct HttpForwarder {
    api_url: url::Url,
    http_client: reqwest::Client,
}

impl HttpForwarder {
    /// Creates a forwarder with a bounded per-request timeout.
    pub fn new(config: &ForwarderConfig) -> Result<Self> {
        config.check()?;

        let api_url = url::Url::parse(&config.api_url)
            .map_err(|e| Error::config(format!("invalid api_url {}: {}", config.api_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_url,
            http_client,
        })
    }

    pub fn api_url(&self) -> &url::Url {
        &self.api_url
    }
}

#[async_trait]
impl EventSink for HttpForwarder {
    async fn forward(&self, hit: &str) -> Result<ForwardOutcome> {
        let start = Instant::now();

        debug!(url = %self.api_url, bytes = hit.len(), "Forwarding analytics event");

        let sent = self
            .http_client
            .post(self.api_url.clone())
            .body(hit.to_owned())
            .send()
            .await;

        metrics()
            .forward_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                health().ingestion.set_unhealthy(format!("transport error: {}", e));
                return Err(Error::delivery(
                    DeliveryErrorCode::Transport,
                    format!("ingestion request failed: {}", e),
                    None,
                ));
            }
        };

        let status = response.status();
        if status.is_success() {
            health().ingestion.set_healthy();
            return Ok(ForwardOutcome::Delivered {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let body = truncate(body, MAX_LOGGED_BODY_BYTES);
        info!(status = %status, body = %body, "Ingestion endpoint rejected event");
        health()
            .ingestion
            .set_unhealthy(format!("ingestion returned {}", status.as_u16()));

        Ok(ForwardOutcome::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
