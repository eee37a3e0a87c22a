//! Event registration repository implementation

use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::InsertOutcome;
use crate::models::registration::{
    EventRegistration, NewRegistration, RegistrationRecord, UpdateRegistrationRequest,
};
use crate::utils::errors::SyncUpError;
use crate::utils::logging::log_database_operation;

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, attendance, qr_code_data, created_at, updated_at";

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the registration of a user for an event
    pub async fn find(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<EventRegistration>, SyncUpError> {
        let registration = sqlx::query_as::<_, EventRegistration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM eventregistrations WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Get registration count for event
    pub async fn count(&self, event_id: Uuid) -> Result<i64, SyncUpError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM eventregistrations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Insert a registration while holding a lock on the event row, so the
    /// capacity check and the insert cannot interleave with another registration.
    pub async fn insert_with_capacity(&self, request: NewRegistration) -> Result<InsertOutcome, SyncUpError> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;

        let capacity: Option<(Option<i32>,)> = sqlx::query_as("SELECT capacity FROM events WHERE id = $1 FOR UPDATE")
            .bind(request.event_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some((capacity,)) = capacity else {
            return Err(SyncUpError::EventNotFound { event_id: request.event_id });
        };

        let existing = sqlx::query_as::<_, EventRegistration>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM eventregistrations WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(request.event_id)
        .bind(request.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = existing {
            tx.rollback().await?;
            return Ok(InsertOutcome::AlreadyRegistered(existing));
        }

        if let Some(capacity) = capacity {
            let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM eventregistrations WHERE event_id = $1")
                .bind(request.event_id)
                .fetch_one(&mut *tx)
                .await?;

            if count.0 >= capacity as i64 {
                tx.rollback().await?;
                return Ok(InsertOutcome::Full);
            }
        }

        let now = Utc::now();
        let registration = sqlx::query_as::<_, EventRegistration>(&format!(
            r#"
            INSERT INTO eventregistrations (id, event_id, user_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.event_id)
        .bind(request.user_id)
        .bind(request.status.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        log_database_operation("insert", "eventregistrations", started.elapsed().as_millis() as u64, true);

        Ok(InsertOutcome::Inserted(registration))
    }

    /// Delete the registration of a user for an event
    pub async fn delete(&self, event_id: Uuid, user_id: Uuid) -> Result<u64, SyncUpError> {
        let result = sqlx::query("DELETE FROM eventregistrations WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Store QR data unless some is stored already, then return the current row
    pub async fn set_qr_code(&self, event_id: Uuid, user_id: Uuid, qr_code_data: &str) -> Result<Option<EventRegistration>, SyncUpError> {
        sqlx::query(
            r#"
            UPDATE eventregistrations
            SET qr_code_data = $3, updated_at = $4
            WHERE event_id = $1 AND user_id = $2 AND qr_code_data IS NULL
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(qr_code_data)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find(event_id, user_id).await
    }

    /// Update status and/or attendance
    pub async fn update(&self, event_id: Uuid, user_id: Uuid, update: UpdateRegistrationRequest) -> Result<Option<EventRegistration>, SyncUpError> {
        let registration = sqlx::query_as::<_, EventRegistration>(&format!(
            r#"
            UPDATE eventregistrations
            SET status = COALESCE($3, status),
                attendance = COALESCE($4, attendance),
                updated_at = $5
            WHERE event_id = $1 AND user_id = $2
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(user_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.attendance.map(|a| a.as_str()))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Registrations of an event joined with attendee profiles
    pub async fn list_with_users(&self, event_id: Uuid) -> Result<Vec<RegistrationRecord>, SyncUpError> {
        let records = sqlx::query_as::<_, RegistrationRecord>(
            r#"
            SELECT r.id, r.event_id, r.user_id, r.status, r.attendance, r.qr_code_data, r.created_at, r.updated_at,
                   u.first_name, u.last_name, u.email
            FROM eventregistrations r
            INNER JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
