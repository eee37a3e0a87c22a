//! CSV export of event registrations

use crate::models::{Event, RegistrationRecord};
use crate::utils::helpers::{escape_csv_field, format_timestamp, sanitize_filename};

pub const CSV_HEADER: [&str; 6] = [
    "First Name",
    "Last Name",
    "Email",
    "Status",
    "Attendance",
    "Registered At",
];

/// Render registrations as CSV, one row per registration in the given order
pub fn registrations_csv(records: &[RegistrationRecord]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');

    for record in records {
        let registration = &record.registration;
        let attendance = registration.attendance.map(|a| a.as_str()).unwrap_or("");
        let registered_at = format_timestamp(registration.created_at);
        let row = [
            record.first_name.as_deref().unwrap_or(""),
            record.last_name.as_deref().unwrap_or(""),
            record.email.as_str(),
            registration.status.as_str(),
            attendance,
            registered_at.as_str(),
        ];

        let line: Vec<String> = row.iter().map(|field| escape_csv_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Download filename for an event's export
pub fn export_filename(event: &Event) -> String {
    format!("{}-registrations.csv", sanitize_filename(&event.title))
}
