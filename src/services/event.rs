//! Event management

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::DataStore;
use crate::models::activity::{ACTION_EVENT_CREATED, ACTION_EVENT_UPDATED};
use crate::models::{CreateEventRequest, Event, EventRegistration, NewActivity, RegistrationRecord, RegistrationStatus, UpdateEventRequest};
use crate::services::notification::NotificationService;
use crate::services::permission::{require_permission, MANAGE_EVENTS};
use crate::services::storage::{StorageBucket, StorageUrls};
use crate::utils::errors::{Result, SyncUpError};
use crate::utils::helpers::normalize_whitespace;
use crate::utils::logging::log_organizer_action;

const UPCOMING_LIMIT: i64 = 100;

/// Event as shown to a signed-in user
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub is_virtual: bool,
    pub attendee_count: i64,
    pub photo_url: Option<String>,
    pub registration: Option<EventRegistration>,
    pub qr_code_data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub photo_url: Option<String>,
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn DataStore>,
    storage: StorageUrls,
    notifications: NotificationService,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(store: Arc<dyn DataStore>, storage: StorageUrls, notifications: NotificationService) -> Self {
        Self {
            store,
            storage,
            notifications,
        }
    }

    fn photo_url(&self, event: &Event) -> Option<String> {
        event
            .photo_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| self.storage.public_url(StorageBucket::EventPhotos, p))
    }

    pub async fn load_event(&self, event_id: Uuid) -> Result<Event> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(SyncUpError::EventNotFound { event_id })
    }

    /// Create an event in an organization
    pub async fn create_event(&self, organizer_id: Uuid, organization_id: Uuid, mut request: CreateEventRequest) -> Result<Event> {
        require_permission(self.store.as_ref(), organizer_id, organization_id, MANAGE_EVENTS).await?;

        request.title = normalize_whitespace(&request.title);
        validate_event_fields(&request.title, request.starts_at, request.ends_at, request.capacity, request.registration_fee)?;

        let event = self.store.create_event(organization_id, organizer_id, request).await?;

        log_organizer_action(organizer_id, "create_event", Some(&event.id.to_string()));
        self.notifications
            .record_activity(NewActivity::new(
                organization_id,
                organizer_id,
                ACTION_EVENT_CREATED,
                json!({ "event_id": event.id, "event_title": event.title }),
            ))
            .await;

        Ok(event)
    }

    /// Apply a partial update, validated against the merged result
    pub async fn update_event(&self, organizer_id: Uuid, event_id: Uuid, mut request: UpdateEventRequest) -> Result<Event> {
        let existing = self.load_event(event_id).await?;
        require_permission(self.store.as_ref(), organizer_id, existing.organization_id, MANAGE_EVENTS).await?;

        request.title = request.title.map(|t| normalize_whitespace(&t));
        validate_event_fields(
            request.title.as_deref().unwrap_or(&existing.title),
            request.starts_at.unwrap_or(existing.starts_at),
            request.ends_at.unwrap_or(existing.ends_at),
            request.capacity.or(existing.capacity),
            request.registration_fee.unwrap_or(existing.registration_fee),
        )?;

        let event = self
            .store
            .update_event(event_id, request)
            .await?
            .ok_or(SyncUpError::EventNotFound { event_id })?;

        log_organizer_action(organizer_id, "update_event", Some(&event_id.to_string()));
        self.notifications
            .record_activity(NewActivity::new(
                event.organization_id,
                organizer_id,
                ACTION_EVENT_UPDATED,
                json!({ "event_id": event.id, "event_title": event.title }),
            ))
            .await;

        Ok(event)
    }

    /// Upcoming events of an organization
    pub async fn list_upcoming(&self, organization_id: Uuid) -> Result<Vec<EventSummary>> {
        let events = self.store.list_upcoming_events(organization_id, UPCOMING_LIMIT).await?;

        Ok(events
            .into_iter()
            .map(|mut event| {
                if event.is_virtual() {
                    event.location = None;
                }
                let photo_url = self.photo_url(&event);
                EventSummary { event, photo_url }
            })
            .collect())
    }

    /// Event with the caller's registration; meeting links stay hidden until registered
    pub async fn event_detail(&self, event_id: Uuid, user_id: Uuid) -> Result<EventDetail> {
        let mut event = self.load_event(event_id).await?;
        let registration = self.store.find_registration(event_id, user_id).await?;
        let attendee_count = self.store.count_registrations(event_id).await?;

        let is_virtual = event.is_virtual();
        let registered = registration
            .as_ref()
            .map(|r| r.status == RegistrationStatus::Registered)
            .unwrap_or(false);
        if is_virtual && !registered {
            event.location = None;
        }

        let photo_url = self.photo_url(&event);
        let qr_code_data = registration.as_ref().and_then(|r| r.qr_code_data.clone());

        Ok(EventDetail {
            event,
            is_virtual,
            attendee_count,
            photo_url,
            registration,
            qr_code_data,
        })
    }

    /// Registrations with attendee profiles, ordered by registration time
    pub async fn list_registrations(&self, organizer_id: Uuid, event_id: Uuid) -> Result<(Event, Vec<RegistrationRecord>)> {
        let event = self.load_event(event_id).await?;
        require_permission(self.store.as_ref(), organizer_id, event.organization_id, MANAGE_EVENTS).await?;

        let records = self.store.list_registrations(event_id).await?;
        Ok((event, records))
    }
}

/// Field rules shared by create and update
pub fn validate_event_fields(
    title: &str,
    starts_at: chrono::DateTime<Utc>,
    ends_at: chrono::DateTime<Utc>,
    capacity: Option<i32>,
    registration_fee: i64,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(SyncUpError::InvalidInput("Title is required".to_string()));
    }
    if ends_at <= starts_at {
        return Err(SyncUpError::InvalidInput("Event must end after it starts".to_string()));
    }
    if let Some(capacity) = capacity {
        if capacity < 1 {
            return Err(SyncUpError::InvalidInput("Capacity must be at least 1".to_string()));
        }
    }
    if registration_fee < 0 {
        return Err(SyncUpError::InvalidInput("Registration fee cannot be negative".to_string()));
    }
    Ok(())
}
