//! Internal telemetry for the event relay.
//!
//! Health and counters live in process; there is no external metrics
//! exporter. `/health` exposes both.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
