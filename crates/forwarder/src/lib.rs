//! Delivery of serialized analytics events to the ingestion endpoint.

pub mod config;
pub mod sink;

pub use config::*;
pub use sink::*;
