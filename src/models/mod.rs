//! Data models module
//!
//! This module contains all data structures used throughout the application.
//! Rows are decoded into these typed records at the database boundary; enum
//! columns stored as text are parsed there and rejected if unknown.

pub mod activity;
pub mod event;
pub mod member;
pub mod notification;
pub mod payment;
pub mod registration;

use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::Row;

// Re-export commonly used models
pub use activity::NewActivity;
pub use event::{CreateEventRequest, Event, EventPrivacy, PrivacyType, UpdateEventRequest};
pub use member::{MemberAccess, UserProfile};
pub use notification::{NewNotification, Notification};
pub use payment::{NewPayment, Payment, PaymentStatus};
pub use registration::{
    Attendance, EventRegistration, NewRegistration, RegistrationRecord, RegistrationStatus,
    UpdateRegistrationRequest,
};

/// Unknown value for a text-backed enum column
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Decode a text column into a typed enum
pub(crate) fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: ParseEnumError| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode a nullable text column into a typed enum
pub(crate) fn parse_optional_column<T>(row: &PgRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        value.parse().map_err(|e: ParseEnumError| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}
