//! Attendance QR codes
//!
//! The payload is a plain URL, `<site>/attendance/<eventId>/<userId>`. Older
//! codes used `?uid=<userId>&event=<eventId>`; the parser accepts both.

use url::Url;
use uuid::Uuid;

use crate::database::DataStore;
use crate::models::{Event, EventRegistration};
use crate::utils::errors::{Result, SyncUpError};

/// Event and user a QR payload points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrTarget {
    pub event_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Clone, Debug)]
pub struct QrService {
    site_url: String,
}

impl QrService {
    pub fn new(site_url: &str) -> Self {
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Deterministic payload for (event, user)
    pub fn payload(&self, event_id: Uuid, user_id: Uuid) -> String {
        format!("{}/attendance/{}/{}", self.site_url, event_id, user_id)
    }

    /// Return the stored QR data, generating it once for physical events.
    ///
    /// Virtual events never get QR data. An existing value is never replaced.
    pub async fn ensure_qr_code(
        &self,
        store: &dyn DataStore,
        event: &Event,
        registration: &EventRegistration,
    ) -> Result<Option<String>> {
        if let Some(existing) = &registration.qr_code_data {
            return Ok(Some(existing.clone()));
        }

        if event.is_virtual() {
            return Ok(None);
        }

        let payload = self.payload(registration.event_id, registration.user_id);
        let stored = store
            .set_qr_code(registration.event_id, registration.user_id, &payload)
            .await?;

        Ok(stored.and_then(|r| r.qr_code_data))
    }
}

/// Parse either QR payload form
pub fn parse_payload(data: &str) -> Result<QrTarget> {
    let invalid = || SyncUpError::InvalidInput("Unrecognized QR code".to_string());
    let url = Url::parse(data.trim()).map_err(|_| invalid())?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if let Some(pos) = segments.iter().rposition(|s| *s == "attendance") {
        if let [event, user] = &segments[pos + 1..] {
            return Ok(QrTarget {
                event_id: parse_id(event).ok_or_else(invalid)?,
                user_id: parse_id(user).ok_or_else(invalid)?,
            });
        }
    }

    let mut event_id = None;
    let mut user_id = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "event" => event_id = parse_id(&value),
            "uid" => user_id = parse_id(&value),
            _ => {}
        }
    }

    match (event_id, user_id) {
        (Some(event_id), Some(user_id)) => Ok(QrTarget { event_id, user_id }),
        _ => Err(invalid()),
    }
}

fn parse_id(raw: &str) -> Option<Uuid> {
    let decoded = urlencoding::decode(raw).ok()?;
    Uuid::parse_str(decoded.trim()).ok()
}
