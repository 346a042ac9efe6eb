//! User profile and subscription gating state.
//!
//! A `UserProfile` is the record the remote data service keeps for an
//! identity. Field names on the wire follow the service's camelCase schema.
//!
//! `ProfileState` replaces a nullable profile: gating code matches on it
//! exhaustively, and both `Unknown` and `NotFound` mean "not a subscriber".

use serde::{Deserialize, Serialize};

use crate::ids::IdentityId;

/// Profile record from the remote data service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Record id assigned by the data service.
    #[serde(rename = "_id")]
    pub record_id: String,
    /// Record creation time (Unix millis, fractional on the wire).
    #[serde(rename = "_creationTime", default)]
    pub created_at: f64,
    /// Identity this profile belongs to.
    pub user_id: IdentityId,
    pub email: String,
    pub name: String,
    /// Paid tier flag.
    #[serde(default)]
    pub is_pro: bool,
    /// When the subscription started (Unix millis).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_since: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemon_squeezy_customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemon_squeezy_order_id: Option<String>,
}

impl UserProfile {
    /// Minimal free-tier profile. Mostly useful for tests and fixtures.
    pub fn free(user_id: impl Into<IdentityId>, email: impl Into<String>, name: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            record_id: format!("users:{}", user_id),
            created_at: crate::now_millis() as f64,
            user_id,
            email: email.into(),
            name: name.into(),
            is_pro: false,
            pro_since: None,
            lemon_squeezy_customer_id: None,
            lemon_squeezy_order_id: None,
        }
    }

    /// Same profile upgraded to the paid tier.
    pub fn upgraded(mut self) -> Self {
        self.is_pro = true;
        self.pro_since = Some(crate::now_millis() as f64);
        self
    }
}

/// What the session currently knows about the signed-in user's profile.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ProfileState {
    /// Lookup has not finished (or never started).
    #[default]
    Unknown,
    /// Lookup returned a record.
    Resolved(UserProfile),
    /// No identity, no record, or the lookup failed.
    NotFound,
}

impl ProfileState {
    /// Whether the paid-tier affordances should be shown.
    pub fn is_subscriber(&self) -> bool {
        match self {
            ProfileState::Resolved(profile) => profile.is_pro,
            ProfileState::Unknown | ProfileState::NotFound => false,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            ProfileState::Resolved(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ProfileState::Unknown)
    }
}

// ============================================================================
// Tests
// ============================================================================
