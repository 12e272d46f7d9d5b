//! Event enrichment: user identity and geo-location.
//!
//! Neither resolver can fail. Geo lookup errors are absorbed here and only
//! show up as a missing property set plus an `info` log line.

use std::sync::Arc;

use geoip::GeoLookup;
use relay_core::{
    authenticated_user_id, limits::ANONYMOUS_USER_ID, ClientAddr, GeoProperties, Principal,
    UserProperties,
};
use telemetry::metrics;
use tracing::{debug, info};

/// Maps a principal to `(user_id, user_properties)`.
pub fn resolve_user(principal: &Principal) -> (String, UserProperties) {
    match principal {
        Principal::Anonymous => (ANONYMOUS_USER_ID.to_string(), UserProperties::anonymous()),
        Principal::Authenticated(profile) => {
            (authenticated_user_id(profile), UserProperties::from(profile))
        }
    }
}

/// Resolves client addresses to geo properties.
///
/// Holds the process-wide GeoIP handle; cloning shares it.
#[derive(Clone)]
pub struct GeoResolver {
    lookup: Option<Arc<dyn GeoLookup>>,
}

impl GeoResolver {
    pub fn new(lookup: Arc<dyn GeoLookup>) -> Self {
        Self {
            lookup: Some(lookup),
        }
    }

    /// A resolver with no database; every event goes out without geo data.
    pub fn disabled() -> Self {
        Self { lookup: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.lookup.is_some()
    }

    /// Looks up the client address.
    ///
    /// Returns `None` when there is no database, no address, the address is
    /// not publicly routable, or the lookup fails.
    pub fn resolve(&self, addr: Option<ClientAddr>) -> Option<GeoProperties> {
        let Some(lookup) = self.lookup.as_ref() else {
            debug!("GeoIP disabled, skipping geo enrichment");
            return None;
        };

        metrics().geo_lookups.inc();

        let Some(addr) = addr else {
            info!("No client address on request, skipping geo enrichment");
            metrics().geo_misses.inc();
            return None;
        };

        if !addr.routable {
            info!(ip = %addr.ip, "Client address not routable, skipping geo enrichment");
            metrics().geo_misses.inc();
            return None;
        }

        match lookup.lookup(addr.ip) {
            Ok(location) => Some(GeoProperties {
                ip: addr.ip.to_string(),
                country: location.country,
                city: location.city,
                region: location.region_code,
                dma: location.metro_code,
                location_lat: location.latitude,
                location_lng: location.longitude,
            }),
            Err(e) => {
                info!(ip = %addr.ip, error = %e, "GeoIP lookup failed");
                metrics().geo_misses.inc();
                None
            }
        }
    }
}

impl std::fmt::Debug for GeoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoResolver")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
