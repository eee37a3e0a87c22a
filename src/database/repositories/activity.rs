//! Notification and activity log repository implementation

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::activity::NewActivity;
use crate::models::notification::{NewNotification, Notification};
use crate::utils::errors::SyncUpError;

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification for a user
    pub async fn create_notification(&self, notification: NewNotification) -> Result<Notification, SyncUpError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, title, body, read, created_at)
            VALUES ($1, $2, $3, $4, false, $5)
            RETURNING id, user_id, title, body, read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.body)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Append an activity log entry
    pub async fn record(&self, activity: NewActivity) -> Result<(), SyncUpError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, organization_id, user_id, action, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(activity.organization_id)
        .bind(activity.user_id)
        .bind(activity.action)
        .bind(activity.details)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
