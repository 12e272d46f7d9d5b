//! GeoIP lookups for the event relay.
//!
//! The MaxMind City database is read fully into memory when the service is
//! opened; lookups are pure in-memory tree walks, reentrant, and safe to run
//! from any number of request handlers through a shared `Arc<GeoIpService>`.

pub mod client_ip;

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use maxminddb::{geoip2, MaxMindDBError, Reader};
use serde::Serialize;

pub use client_ip::{is_routable, parse_candidate, resolve_client_addr};

#[derive(Debug, thiserror::Error)]
pub enum GeoIpError {
    #[error("GeoIP database not configured")]
    NotConfigured,

    #[error("GeoIP database not found at path: {0}")]
    DatabaseNotFound(String),

    #[error("failed to open GeoIP database: {0}")]
    DatabaseOpen(#[source] MaxMindDBError),

    #[error("address not in GeoIP database: {0}")]
    AddressNotFound(IpAddr),

    #[error("failed to look up IP address: {0}")]
    Lookup(#[source] MaxMindDBError),
}

pub type Result<T> = std::result::Result<T, GeoIpError>;

/// Location attributes for one address. Any attribute may be unknown.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    /// Designated market area code (US only).
    pub metro_code: Option<u16>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

/// Read-only lookup keyed by IP address.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self, ip: IpAddr) -> Result<GeoLocation>;
}

pub struct GeoIpService {
    reader: Arc<Reader<Vec<u8>>>,
    database_path: String,
}

impl std::fmt::Debug for GeoIpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIpService")
            .field("database_path", &self.database_path)
            .finish()
    }
}

impl GeoIpService {
    /// Opens the database at `database_path`, loading it into memory.
    #[tracing::instrument(level = "info", skip(database_path), fields(path))]
    pub fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let path = database_path.as_ref();
        let path_str = path.display().to_string();
        tracing::Span::current().record("path", path_str.as_str());

        if !path.exists() {
            return Err(GeoIpError::DatabaseNotFound(path_str));
        }

        let reader = Reader::open_readfile(path).map_err(GeoIpError::DatabaseOpen)?;

        tracing::info!(
            database_type = %reader.metadata.database_type,
            build_epoch = reader.metadata.build_epoch,
            "GeoIP database loaded"
        );

        Ok(Self {
            reader: Arc::new(reader),
            database_path: path_str,
        })
    }

    /// Opens the database if a path is configured.
    pub fn open_configured(database_path: Option<&str>) -> Result<Self> {
        match database_path {
            Some(path) if !path.trim().is_empty() => Self::open(path.trim()),
            _ => Err(GeoIpError::NotConfigured),
        }
    }

    pub fn database_path(&self) -> &str {
        &self.database_path
    }

}

impl GeoLookup for GeoIpService {
    #[tracing::instrument(level = "trace", skip(self), fields(ip = %ip))]
    fn lookup(&self, ip: IpAddr) -> Result<GeoLocation> {
        let city: geoip2::City = self.reader.lookup(ip).map_err(|e| match e {
            MaxMindDBError::AddressNotFoundError(_) => GeoIpError::AddressNotFound(ip),
            other => GeoIpError::Lookup(other),
        })?;

        // First subdivision is the state/province.
        let (region, region_code) = city
            .subdivisions
            .and_then(|subs| subs.into_iter().next())
            .map(|sub| (english(sub.names), sub.iso_code.map(String::from)))
            .unwrap_or((None, None));

        let (country, country_code) = city
            .country
            .map(|c| (english(c.names), c.iso_code.map(String::from)))
            .unwrap_or((None, None));

        let location = city.location;

        Ok(GeoLocation {
            city: city.city.and_then(|c| english(c.names)),
            region,
            region_code,
            country,
            country_code,
            metro_code: location.as_ref().and_then(|l| l.metro_code),
            latitude: location.as_ref().and_then(|l| l.latitude),
            longitude: location.as_ref().and_then(|l| l.longitude),
            timezone: location.and_then(|l| l.time_zone).map(String::from),
        })
    }
}

fn english(names: Option<BTreeMap<&str, &str>>) -> Option<String> {
    names.and_then(|n| n.get("en").map(|s| s.to_string()))
}
