//! Event registration model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::{parse_column, parse_optional_column, ParseEnumError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub attendance: Option<Attendance>,
    pub qr_code_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for EventRegistration {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            event_id: row.try_get("event_id")?,
            user_id: row.try_get("user_id")?,
            status: parse_column(row, "status")?,
            attendance: parse_optional_column(row, "attendance")?,
            qr_code_data: row.try_get("qr_code_data")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    /// Seat held while an online invoice is open
    Pending,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(RegistrationStatus::Registered),
            "pending" => Ok(RegistrationStatus::Pending),
            other => Err(ParseEnumError::new("registration status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    Present,
    Absent,
    Late,
}

impl Attendance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Present => "present",
            Attendance::Absent => "absent",
            Attendance::Late => "late",
        }
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attendance {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Attendance::Present),
            "absent" => Ok(Attendance::Absent),
            "late" => Ok(Attendance::Late),
            other => Err(ParseEnumError::new("attendance", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegistration {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
}

/// Registration joined with the attendee's profile, for organizer views and exports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationRecord {
    #[serde(flatten)]
    pub registration: EventRegistration,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

impl<'r> FromRow<'r, PgRow> for RegistrationRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            registration: EventRegistration::from_row(row)?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRegistrationRequest {
    pub status: Option<RegistrationStatus>,
    pub attendance: Option<Attendance>,
}
