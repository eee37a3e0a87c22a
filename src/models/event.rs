//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Free text venue, or an http(s) link for virtual events
    pub location: Option<String>,
    /// `None` means unlimited
    pub capacity: Option<i32>,
    pub registration_fee: i64,
    /// Attendees may pay at the venue instead of online
    pub onsite: bool,
    pub privacy: EventPrivacy,
    pub photo_path: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Virtual events carry a meeting link as their location
    pub fn is_virtual(&self) -> bool {
        self.location
            .as_deref()
            .map(is_meeting_link)
            .unwrap_or(false)
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }

    /// Registration closes once the event starts
    pub fn registration_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    pub fn requires_payment(&self) -> bool {
        self.registration_fee > 0
    }

    pub fn is_private(&self) -> bool {
        self.privacy.kind == PrivacyType::Private
    }
}

/// True when the location parses as an http(s) URL with a host.
///
/// Other schemes (`mailto:`, `tel:`, bare `room:12`) count as physical venues.
pub fn is_meeting_link(location: &str) -> bool {
    match Url::parse(location.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

impl<'r> FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let privacy: Json<EventPrivacy> = row.try_get("privacy")?;

        Ok(Self {
            id: row.try_get("id")?,
            organization_id: row.try_get("organization_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            location: row.try_get("location")?,
            capacity: row.try_get("capacity")?,
            registration_fee: row.try_get("registration_fee")?,
            onsite: row.try_get("onsite")?,
            privacy: privacy.0,
            photo_path: row.try_get("photo_path")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyType {
    #[default]
    Public,
    Private,
}

/// Rule restricting who may register for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPrivacy {
    #[serde(rename = "type")]
    pub kind: PrivacyType,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub membership_tiers: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_all_roles: bool,
    #[serde(default = "default_true")]
    pub allow_all_memberships: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EventPrivacy {
    fn default() -> Self {
        Self::public()
    }
}

impl EventPrivacy {
    pub fn public() -> Self {
        Self {
            kind: PrivacyType::Public,
            roles: Vec::new(),
            membership_tiers: Vec::new(),
            allow_all_roles: true,
            allow_all_memberships: true,
        }
    }

    /// Private event open to every organization member
    pub fn members_only() -> Self {
        Self {
            kind: PrivacyType::Private,
            ..Self::public()
        }
    }

    pub fn restricts_roles(&self) -> bool {
        !self.allow_all_roles && !self.roles.is_empty()
    }

    pub fn restricts_tiers(&self) -> bool {
        !self.allow_all_memberships && !self.membership_tiers.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    #[serde(default)]
    pub registration_fee: i64,
    #[serde(default)]
    pub onsite: bool,
    #[serde(default)]
    pub privacy: EventPrivacy,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub registration_fee: Option<i64>,
    pub onsite: Option<bool>,
    pub privacy: Option<EventPrivacy>,
    pub photo_path: Option<String>,
}
