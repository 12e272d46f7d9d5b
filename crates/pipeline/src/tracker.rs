//! The post-processing hook.
//!
//! [`Tracker::track`] runs after a handler has produced its result. It never
//! fails and never touches the result: every problem is logged at `info` and
//! reported through [`TrackOutcome`] for tests and metrics only.

use std::sync::Arc;

use forwarder::{EventSink, ForwardOutcome};
use relay_core::{ActionResult, IngestionPayload, RequestContext, TrackedAction};
use telemetry::metrics;
use tracing::{debug, info};

use crate::builder::EventBuilder;

/// What happened to one tracked action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The handler did not succeed; nothing was sent.
    Skipped { status: u16 },
    /// The ingestion endpoint answered 2xx.
    Delivered { insert_id: String },
    /// The ingestion endpoint answered with a non-2xx status.
    Rejected { insert_id: String, status: u16 },
    /// The event could not be built or the request never completed.
    /// `hit` is the redacted payload when one had been serialized.
    Failed { error: String, hit: Option<String> },
}

impl TrackOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped { .. } => "skipped",
            Self::Delivered { .. } => "delivered",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn insert_id(&self) -> Option<&str> {
        match self {
            Self::Delivered { insert_id } | Self::Rejected { insert_id, .. } => Some(insert_id),
            Self::Skipped { .. } | Self::Failed { .. } => None,
        }
    }
}

/// Builds and forwards one analytics event per successful tracked action.
pub struct Tracker {
    api_key: String,
    builder: EventBuilder,
    sink: Arc<dyn EventSink>,
}

impl Tracker {
    pub fn new(api_key: impl Into<String>, builder: EventBuilder, sink: Arc<dyn EventSink>) -> Self {
        Self {
            api_key: api_key.into(),
            builder,
            sink,
        }
    }

    /// Tracks one completed action.
    pub async fn track(
        &self,
        result: &ActionResult,
        action: &TrackedAction,
        ctx: &RequestContext,
    ) -> TrackOutcome {
        if !result.is_success() {
            debug!(action = %action, status = result.status, "Handler did not succeed, not tracking");
            metrics().events_skipped.inc();
            return TrackOutcome::Skipped {
                status: result.status,
            };
        }

        metrics().events_tracked.inc();

        let event = match self.builder.build(result, action, ctx) {
            Ok(event) => event,
            Err(e) => {
                info!(action = %action, error = %e, "Failed to build analytics event");
                metrics().build_failures.inc();
                return TrackOutcome::Failed {
                    error: e.to_string(),
                    hit: None,
                };
            }
        };

        let insert_id = event.insert_id.clone();
        let payload = IngestionPayload::single(self.api_key.as_str(), event);

        let (hit, redacted) = match serialize(&payload) {
            Ok(pair) => pair,
            Err(e) => {
                info!(action = %action, error = %e, "Failed to serialize analytics event");
                metrics().build_failures.inc();
                return TrackOutcome::Failed {
                    error: e.to_string(),
                    hit: None,
                };
            }
        };

        match self.sink.forward(&hit).await {
            Ok(ForwardOutcome::Delivered { status }) => {
                debug!(insert_id = %insert_id, status, "Analytics event delivered");
                metrics().events_delivered.inc();
                TrackOutcome::Delivered { insert_id }
            }
            Ok(ForwardOutcome::Rejected { status, body }) => {
                info!(
                    insert_id = %insert_id,
                    status,
                    body = %body,
                    hit = %redacted,
                    "Analytics event rejected"
                );
                metrics().events_rejected.inc();
                TrackOutcome::Rejected { insert_id, status }
            }
            Err(e) => {
                info!(insert_id = %insert_id, error = %e, hit = %redacted, "Failed to forward analytics event");
                metrics().delivery_failures.inc();
                TrackOutcome::Failed {
                    error: e.to_string(),
                    hit: Some(redacted),
                }
            }
        }
    }
}

/// Wire form plus the redacted copy used in log lines.
fn serialize(payload: &IngestionPayload) -> relay_core::Result<(String, String)> {
    Ok((payload.to_hit()?, payload.redacted_hit()?))
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
