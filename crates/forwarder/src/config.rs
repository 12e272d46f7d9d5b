//! Forwarder configuration.

use std::fmt;
use std::time::Duration;

use relay_core::limits::{DEFAULT_FORWARD_TIMEOUT, DEFAULT_INGESTION_URL, MAX_FORWARD_TIMEOUT_MS};
use relay_core::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Ingestion endpoint configuration.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ForwarderConfig {
    /// Ingestion endpoint URL
    #[serde(default = "default_api_url")]
    #[validate(url)]
    pub api_url: String,
    /// Project API key sent in every payload
    #[serde(default)]
    #[validate(length(min = 1, message = "api_key must be set"))]
    pub api_key: String,
    /// Timeout for one forwarding attempt in milliseconds
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1, max = 30000))]
    pub timeout_ms: u64,
}

fn default_api_url() -> String {
    DEFAULT_INGESTION_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_FORWARD_TIMEOUT.as_millis() as u64
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ForwarderConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.min(MAX_FORWARD_TIMEOUT_MS))
    }

    /// Validates the configuration, flattening field errors into one message.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::config(format!("invalid forwarder config: {}", e)))
    }
}

// The API key never reaches the logs.
impl fmt::Debug for ForwarderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwarderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
