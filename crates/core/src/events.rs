//! Analytics event definitions and the ingestion payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::limits::{ANONYMOUS_NAME, STABLE_ID_FIELD, USER_ID_PREFIX};
use crate::principal::UserProfile;

/// User properties attached to every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProperties {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub reputation: i64,
    pub is_suspended: bool,
    pub probable_spammer: bool,
    pub invited_by_id: Option<i64>,
    pub is_hub_editor: bool,
}

impl UserProperties {
    /// Placeholder properties for unauthenticated principals.
    pub fn anonymous() -> Self {
        Self {
            email: String::new(),
            first_name: ANONYMOUS_NAME.to_string(),
            last_name: ANONYMOUS_NAME.to_string(),
            reputation: 0,
            is_suspended: false,
            probable_spammer: false,
            invited_by_id: None,
            is_hub_editor: false,
        }
    }
}

impl From<&UserProfile> for UserProperties {
    fn from(profile: &UserProfile) -> Self {
        Self {
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            reputation: profile.reputation,
            is_suspended: profile.is_suspended,
            probable_spammer: profile.probable_spammer,
            invited_by_id: profile.invited_by_id,
            is_hub_editor: profile.is_hub_editor,
        }
    }
}

/// `user_id` for an authenticated user: `"user: <email>_<id>"`.
pub fn authenticated_user_id(profile: &UserProfile) -> String {
    format!("{}{}_{}", USER_ID_PREFIX, profile.email, profile.id)
}

/// Geo-location properties.
///
/// Serialized at the top level of the event, as the ingestion API expects.
/// Attributes the database does not know are sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoProperties {
    pub ip: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    /// Designated market area (metro) code.
    pub dma: Option<u16>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
}

/// A single analytics event, ready to be forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub user_id: String,
    pub event_type: String,
    /// Handler payload, verbatim.
    pub event_properties: Value,
    pub user_properties: UserProperties,
    /// Deduplication key, see [`insert_id`].
    pub insert_id: String,
    /// Omitted entirely when the geo lookup failed.
    #[serde(flatten)]
    pub geo: Option<GeoProperties>,
}

impl AnalyticsEvent {
    /// Whether any geo attributes were attached.
    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }
}

/// Extracts the payload's stable identifier as a string.
///
/// Numbers render in decimal, strings verbatim, other JSON values as their
/// JSON text. A missing or null `id` (or a payload that is not an object)
/// fails with [`Error::MissingField`].
pub fn stable_id(data: &Value) -> Result<String> {
    match data.get(STABLE_ID_FIELD) {
        None | Some(Value::Null) => Err(Error::missing_field(STABLE_ID_FIELD)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Ok(other.to_string()),
    }
}

/// Deduplication key: `"<event_type>_<stable id>"`.
///
/// Pure function of its inputs, so retries and duplicate sends of the same
/// logical event collapse downstream.
pub fn insert_id(event_type: &str, stable_id: &str) -> String {
    format!("{}_{}", event_type, stable_id)
}

/// Request body of the ingestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionPayload {
    pub api_key: String,
    pub events: Vec<AnalyticsEvent>,
}

impl IngestionPayload {
    /// Payload carrying exactly one event.
    pub fn single(api_key: impl Into<String>, event: AnalyticsEvent) -> Self {
        Self {
            api_key: api_key.into(),
            events: vec![event],
        }
    }

    /// Serializes the payload to its wire form (the "hit").
    pub fn to_hit(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The hit with the API key masked, for logs.
    pub fn redacted_hit(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        value["api_key"] = Value::String("<redacted>".to_string());
        Ok(value.to_string())
    }
}
