//! Core types for the analytics event relay.

pub mod context;
pub mod error;
pub mod events;
pub mod limits;
pub mod principal;

pub use context::*;
pub use error::{Error, Result};
pub use events::*;
pub use principal::*;
