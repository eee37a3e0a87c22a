//! Payment repository implementation

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::payment::{NewPayment, Payment, PaymentStatus};
use crate::utils::errors::SyncUpError;

const PAYMENT_COLUMNS: &str = "id, invoice_id, invoice_url, external_id, amount, status, target_type, target_id, organization_id, user_id, created_at, updated_at";

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a newly created invoice
    pub async fn create(&self, payment: NewPayment) -> Result<Payment, SyncUpError> {
        let now = Utc::now();
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (id, invoice_id, invoice_url, external_id, amount, status, target_type, target_id, organization_id, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $10)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(payment.invoice_id)
        .bind(payment.invoice_url)
        .bind(payment.external_id)
        .bind(payment.amount)
        .bind(payment.target_type)
        .bind(payment.target_id)
        .bind(payment.organization_id)
        .bind(payment.user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Find payment by provider invoice ID
    pub async fn find_by_invoice(&self, invoice_id: &str) -> Result<Option<Payment>, SyncUpError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Latest pending payment of a user for a target
    pub async fn find_open(&self, target_id: Uuid, user_id: Uuid) -> Result<Option<Payment>, SyncUpError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE target_id = $1 AND user_id = $2 AND status = 'pending' ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(target_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    /// Update payment status
    pub async fn update_status(&self, invoice_id: &str, status: PaymentStatus) -> Result<Option<Payment>, SyncUpError> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $2, updated_at = $3
            WHERE invoice_id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(invoice_id)
        .bind(status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }
}
