//! Payment model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::{parse_column, ParseEnumError};

/// Target type recorded for registration fees
pub const TARGET_EVENT_REGISTRATION: &str = "event_registration";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: String,
    pub invoice_url: String,
    pub external_id: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub target_type: String,
    pub target_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            invoice_id: row.try_get("invoice_id")?,
            invoice_url: row.try_get("invoice_url")?,
            external_id: row.try_get("external_id")?,
            amount: row.try_get("amount")?,
            status: parse_column(row, "status")?,
            target_type: row.try_get("target_type")?,
            target_id: row.try_get("target_id")?,
            organization_id: row.try_get("organization_id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Expired,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "expired" => Ok(PaymentStatus::Expired),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(ParseEnumError::new("payment status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub invoice_id: String,
    pub invoice_url: String,
    pub external_id: String,
    pub amount: i64,
    pub target_type: String,
    pub target_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
}
