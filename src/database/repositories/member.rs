//! Organization member repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::member::{MemberAccess, UserProfile};
use crate::utils::errors::SyncUpError;

#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Membership row of a user in an organization with its role names
    pub async fn find_access(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<MemberAccess>, SyncUpError> {
        let access = sqlx::query_as::<_, MemberAccess>(
            r#"
            SELECT m.id AS member_id, m.organization_id, m.user_id, m.membership_tier,
                   COALESCE(ARRAY_AGG(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
            FROM organizationmembers m
            LEFT JOIN organization_members_roles mr ON mr.member_id = m.id
            LEFT JOIN organization_roles r ON r.id = mr.role_id
            WHERE m.organization_id = $1 AND m.user_id = $2
            GROUP BY m.id
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(access)
    }

    /// Remote permission check
    pub async fn has_permission(&self, user_id: Uuid, organization_id: Uuid, permission: &str) -> Result<bool, SyncUpError> {
        let allowed: (bool,) = sqlx::query_as("SELECT has_permission($1, $2, $3)")
            .bind(user_id)
            .bind(organization_id)
            .bind(permission)
            .fetch_one(&self.pool)
            .await?;

        Ok(allowed.0)
    }

    /// Find user profile by ID
    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, SyncUpError> {
        let user = sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, first_name, last_name FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
