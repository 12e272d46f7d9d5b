//! Event Relay
//!
//! Enriches and forwards one analytics event per successful tracked action:
//! - User identity and geo-location enrichment
//! - Deduplicated event construction
//! - Inline delivery to the analytics ingestion API, failures logged only

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use forwarder::{ForwarderConfig, HttpForwarder};
use geoip::{GeoIpError, GeoIpService, GeoLookup};
use pipeline::{EventBuilder, GeoResolver, Tracker};
use telemetry::{health, init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    forwarder: ForwarderConfig,

    /// MaxMind City database; geo enrichment is disabled when unset
    #[serde(default)]
    geoip_database_path: Option<String>,

    /// Shared secret for `/v1/track`; the endpoint refuses all callers when unset
    #[serde(default)]
    relay_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            forwarder: ForwarderConfig::default(),
            geoip_database_path: None,
            relay_token: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Event Relay v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    config
        .forwarder
        .check()
        .context("Invalid forwarder configuration")?;

    info!(forwarder = ?config.forwarder, "Loaded forwarder config");

    // One handle for the whole process
    let geo_db = open_geoip(config.geoip_database_path.as_deref());
    let geo = match &geo_db {
        Some(db) => GeoResolver::new(db.clone() as Arc<dyn GeoLookup>),
        None => GeoResolver::disabled(),
    };

    let forwarder = HttpForwarder::new(&config.forwarder).context("Failed to create forwarder")?;
    info!(url = %forwarder.api_url(), "Forwarding analytics events");

    let tracker = Tracker::new(
        config.forwarder.api_key.clone(),
        EventBuilder::new(geo),
        Arc::new(forwarder),
    );
    let state = AppState::new(Arc::new(tracker)).with_relay_token(config.relay_token.as_deref());
    if state.relay_token.is_none() {
        warn!("No relay token configured, /v1/track will refuse all requests");
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    health().mark_started();
    info!("Listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    if let Some(db) = geo_db {
        info!(path = db.database_path(), "Releasing GeoIP database");
        drop(db);
    }

    let snapshot = metrics().snapshot();
    info!(
        tracked = snapshot.events_tracked,
        delivered = snapshot.events_delivered,
        rejected = snapshot.events_rejected,
        failed = snapshot.delivery_failures + snapshot.build_failures,
        "Shutdown complete"
    );
    Ok(())
}

/// Opens the GeoIP database, recording the result in the health registry.
///
/// Startup continues without geo enrichment when the database is missing.
fn open_geoip(path: Option<&str>) -> Option<Arc<GeoIpService>> {
    match GeoIpService::open_configured(path) {
        Ok(service) => {
            health().geoip.set_healthy();
            Some(Arc::new(service))
        }
        Err(GeoIpError::NotConfigured) => {
            health().geoip.set_unhealthy("not configured");
            warn!("No GeoIP database configured, geo enrichment disabled");
            None
        }
        Err(e) => {
            health().geoip.set_unhealthy(e.to_string());
            error!(error = %e, "Failed to open GeoIP database, geo enrichment disabled");
            None
        }
    }
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("RELAY")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Flat aliases for the settings deployments set most often
    if let Ok(api_key) = std::env::var("RELAY_API_KEY") {
        config.forwarder.api_key = api_key;
    }
    if let Ok(api_url) = std::env::var("RELAY_API_URL") {
        config.forwarder.api_url = api_url;
    }
    if let Ok(path) = std::env::var("RELAY_GEOIP_DATABASE_PATH") {
        config.geoip_database_path = Some(path);
    }
    if let Ok(token) = std::env::var("RELAY_TOKEN") {
        config.relay_token = Some(token);
    }

    Ok(config)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
