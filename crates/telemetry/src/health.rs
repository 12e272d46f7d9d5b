//! Health check aggregation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Health status for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Last observed state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    /// Not exercised yet
    Unknown,
    Healthy,
    Unhealthy,
}

impl ComponentState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Healthy,
            2 => Self::Unhealthy,
            _ => Self::Unknown,
        }
    }
}

/// Component health state.
#[derive(Debug)]
pub struct ComponentHealth {
    name: &'static str,
    state: AtomicU8,
    message: parking_lot::RwLock<Option<String>>,
}

impl ComponentHealth {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: AtomicU8::new(ComponentState::Unknown as u8),
            message: parking_lot::RwLock::new(None),
        }
    }

    pub fn set_healthy(&self) {
        self.state.store(ComponentState::Healthy as u8, Ordering::Relaxed);
        *self.message.write() = None;
    }

    pub fn set_unhealthy(&self, msg: impl Into<String>) {
        self.state.store(ComponentState::Unhealthy as u8, Ordering::Relaxed);
        *self.message.write() = Some(msg.into());
    }

    pub fn state(&self) -> ComponentState {
        ComponentState::from_u8(self.state.load(Ordering::Relaxed))
    }

    pub fn is_healthy(&self) -> bool {
        self.state() == ComponentState::Healthy
    }

    pub fn message(&self) -> Option<String> {
        self.message.read().clone()
    }

    fn report(&self) -> ComponentHealthReport {
        ComponentHealthReport {
            name: self.name.to_string(),
            state: self.state(),
            healthy: self.is_healthy(),
            message: self.message(),
        }
    }
}

/// Aggregated health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealthReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealthReport {
    pub name: String,
    pub state: ComponentState,
    pub healthy: bool,
    pub message: Option<String>,
}

/// Health registry for the relay's outbound dependencies.
///
/// Neither component gates readiness: a missing GeoIP database only drops geo
/// properties, and a failing ingestion endpoint only drops events.
pub struct HealthRegistry {
    /// GeoIP database handle
    pub geoip: ComponentHealth,
    /// Analytics ingestion endpoint, updated after every delivery attempt
    pub ingestion: ComponentHealth,
    started: AtomicBool,
}

impl HealthRegistry {
    pub const fn new() -> Self {
        Self {
            geoip: ComponentHealth::new("geoip"),
            ingestion: ComponentHealth::new("ingestion"),
            started: AtomicBool::new(false),
        }
    }

    /// Generate a health report.
    ///
    /// Unhealthy only until startup completes. After that a failing
    /// component degrades the service and an unexercised one counts as fine.
    pub fn report(&self) -> HealthReport {
        let components = vec![self.geoip.report(), self.ingestion.report()];

        let any_unhealthy = components
            .iter()
            .any(|c| c.state == ComponentState::Unhealthy);

        let status = if !self.is_ready() {
            HealthStatus::Unhealthy
        } else if any_unhealthy {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport { status, components }
    }

    /// Marks startup (config, GeoIP, forwarder) as complete.
    pub fn mark_started(&self) {
        self.started.store(true, Ordering::Relaxed);
    }

    /// Check if the service can accept traffic.
    pub fn is_ready(&self) -> bool {
        self.started.load(Ordering::Relaxed)
    }

    /// Check if the service is alive.
    pub fn is_alive(&self) -> bool {
        true
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global health registry.
pub static HEALTH: std::sync::LazyLock<HealthRegistry> =
    std::sync::LazyLock::new(HealthRegistry::new);

/// Get the global health registry.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
