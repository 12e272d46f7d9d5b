//! The tracking pipeline.
//!
//! Runs once per completed request:
//! - Enrichment (user properties, geo properties)
//! - Build (event type, dedup key, final event)
//! - Forward (one inline delivery attempt)
//!
//! [`Tracker`] is the post-processing hook that strings these together and
//! guarantees nothing escapes to the caller.

pub mod builder;
pub mod enrichment;
pub mod tracker;

pub use builder::EventBuilder;
pub use enrichment::{resolve_user, GeoResolver};
pub use tracker::{TrackOutcome, Tracker};
