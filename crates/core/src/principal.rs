//! Principal types supplied by the host's authentication layer.

use serde::{Deserialize, Serialize};

/// Profile fields of an authenticated user, as read from the identity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub reputation: i64,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default)]
    pub probable_spammer: bool,
    /// Referring user, if the referrer record still exists.
    #[serde(default)]
    pub invited_by_id: Option<i64>,
    /// Editor status as computed by the identity store's own policy.
    #[serde(default)]
    pub is_hub_editor: bool,
}

/// The user (or anonymous placeholder) behind a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    #[default]
    Anonymous,
    Authenticated(UserProfile),
}

impl Principal {
    pub fn authenticated(profile: UserProfile) -> Self {
        Self::Authenticated(profile)
    }
}
