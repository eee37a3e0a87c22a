//! Event repository implementation

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::event::{CreateEventRequest, Event, UpdateEventRequest};
use crate::utils::errors::SyncUpError;

const EVENT_COLUMNS: &str = "id, organization_id, title, description, starts_at, ends_at, location, capacity, registration_fee, onsite, privacy, photo_path, created_by, created_at, updated_at";

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, organization_id: Uuid, created_by: Uuid, request: CreateEventRequest) -> Result<Event, SyncUpError> {
        let now = Utc::now();
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, organization_id, title, description, starts_at, ends_at, location, capacity, registration_fee, onsite, privacy, photo_path, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(request.location)
        .bind(request.capacity)
        .bind(request.registration_fee)
        .bind(request.onsite)
        .bind(Json(request.privacy))
        .bind(request.photo_path)
        .bind(created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, SyncUpError> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Update event
    pub async fn update(&self, id: Uuid, request: UpdateEventRequest) -> Result<Option<Event>, SyncUpError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                starts_at = COALESCE($4, starts_at),
                ends_at = COALESCE($5, ends_at),
                location = COALESCE($6, location),
                capacity = COALESCE($7, capacity),
                registration_fee = COALESCE($8, registration_fee),
                onsite = COALESCE($9, onsite),
                privacy = COALESCE($10, privacy),
                photo_path = COALESCE($11, photo_path),
                updated_at = $12
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.title)
        .bind(request.description)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(request.location)
        .bind(request.capacity)
        .bind(request.registration_fee)
        .bind(request.onsite)
        .bind(request.privacy.map(Json))
        .bind(request.photo_path)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Get upcoming events for an organization
    pub async fn get_upcoming_events(&self, organization_id: Uuid, limit: i64) -> Result<Vec<Event>, SyncUpError> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organization_id = $1 AND ends_at > NOW() ORDER BY starts_at ASC LIMIT $2"
        ))
        .bind(organization_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}
