//! Unified error types for the event relay.
//!
//! Error codes:
//! - BUILD_001-002: Event build errors
//! - DELIVERY_001-002: Forwarding errors
//! - CONFIG_001: Configuration errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Event build error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildErrorCode {
    /// BUILD_001: Payload has no stable identifier
    MissingStableId,
    /// BUILD_002: Event could not be serialized
    Serialization,
}

impl BuildErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingStableId => "BUILD_001",
            Self::Serialization => "BUILD_002",
        }
    }
}

/// Delivery error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorCode {
    /// DELIVERY_001: Transport failure (connect, timeout, TLS)
    Transport,
    /// DELIVERY_002: Endpoint answered with a non-2xx status
    Rejected,
}

impl DeliveryErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "DELIVERY_001",
            Self::Rejected => "DELIVERY_002",
        }
    }
}

/// Unified error type for the event relay.
#[derive(Debug, Error)]
pub enum Error {
    /// Delivery error with code.
    #[error("[{code}] {message}")]
    Delivery {
        code: &'static str,
        message: String,
        status: Option<u16>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a delivery error.
    pub fn delivery(code: DeliveryErrorCode, msg: impl Into<String>, status: Option<u16>) -> Self {
        Self::Delivery {
            code: code.code(),
            message: msg.into(),
            status,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Delivery { code, .. } => Some(code),
            Self::MissingField(_) => Some(BuildErrorCode::MissingStableId.code()),
            Self::Serialization(_) => Some(BuildErrorCode::Serialization.code()),
            _ => None,
        }
    }

    /// Whether the error happened while assembling the event, before any
    /// network call was made.
    pub fn is_build_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::Serialization(_)
        )
    }
}
