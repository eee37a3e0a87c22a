//! Attendance marking
//!
//! Organizers scan an attendee's QR code at the venue, or set attendance by
//! hand. A scan later than the configured grace period after the event start
//! marks the attendee late.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::database::DataStore;
use crate::models::activity::ACTION_ATTENDANCE_MARKED;
use crate::models::{Attendance, Event, EventRegistration, NewActivity, RegistrationStatus, UpdateRegistrationRequest};
use crate::services::notification::NotificationService;
use crate::services::payment::PaymentClient;
use crate::services::permission::{require_permission, MANAGE_ATTENDANCE, MANAGE_EVENTS};
use crate::services::qr::{parse_payload, QrService};
use crate::utils::errors::{Result, SyncUpError};
use crate::utils::logging::{log_attendance_action, log_organizer_action};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub qr_code_data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub attendance: Attendance,
    pub registration: EventRegistration,
}

/// Longest accepted grace period, one week
pub const MAX_LATE_AFTER_MINUTES: i64 = 7 * 24 * 60;

/// Attendance for a scan at `scanned_at`
pub fn attendance_for_scan(event: &Event, scanned_at: DateTime<Utc>, late_after_minutes: i64) -> Attendance {
    let grace = Duration::minutes(late_after_minutes.clamp(0, MAX_LATE_AFTER_MINUTES));
    match event.starts_at.checked_add_signed(grace) {
        Some(late_from) if scanned_at > late_from => Attendance::Late,
        _ => Attendance::Present,
    }
}

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn DataStore>,
    payments: PaymentClient,
    qr: QrService,
    notifications: NotificationService,
    late_after_minutes: i64,
}

impl AttendanceService {
    /// Create a new AttendanceService instance
    pub fn new(
        store: Arc<dyn DataStore>,
        payments: PaymentClient,
        qr: QrService,
        notifications: NotificationService,
        late_after_minutes: i64,
    ) -> Self {
        Self {
            store,
            payments,
            qr,
            notifications,
            late_after_minutes,
        }
    }

    async fn load_event(&self, event_id: Uuid) -> Result<Event> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(SyncUpError::EventNotFound { event_id })
    }

    /// Mark attendance from a scanned QR payload
    pub async fn scan(&self, scanner_id: Uuid, qr_code_data: &str) -> Result<ScanResult> {
        self.scan_at(scanner_id, qr_code_data, Utc::now()).await
    }

    pub async fn scan_at(&self, scanner_id: Uuid, qr_code_data: &str, scanned_at: DateTime<Utc>) -> Result<ScanResult> {
        let target = parse_payload(qr_code_data)?;
        let event = self.load_event(target.event_id).await?;

        require_permission(self.store.as_ref(), scanner_id, event.organization_id, MANAGE_ATTENDANCE).await?;

        let registration = self
            .store
            .find_registration(target.event_id, target.user_id)
            .await?
            .ok_or(SyncUpError::RegistrationNotFound {
                event_id: target.event_id,
                user_id: target.user_id,
            })?;

        if registration.status != RegistrationStatus::Registered {
            return Err(SyncUpError::InvalidInput(
                "Registration is awaiting payment and cannot be checked in".to_string(),
            ));
        }

        let attendance = attendance_for_scan(&event, scanned_at, self.late_after_minutes);
        let registration = self
            .store
            .update_registration(
                target.event_id,
                target.user_id,
                UpdateRegistrationRequest {
                    status: None,
                    attendance: Some(attendance),
                },
            )
            .await?
            .ok_or(SyncUpError::RegistrationNotFound {
                event_id: target.event_id,
                user_id: target.user_id,
            })?;

        log_attendance_action(event.id, target.user_id, scanner_id, attendance.as_str());
        self.notifications
            .record_activity(NewActivity::new(
                event.organization_id,
                scanner_id,
                ACTION_ATTENDANCE_MARKED,
                json!({ "event_id": event.id, "attendee_id": target.user_id, "attendance": attendance }),
            ))
            .await;

        Ok(ScanResult {
            event_id: target.event_id,
            user_id: target.user_id,
            attendance,
            registration,
        })
    }

    /// Organizer override of a registration's status or attendance.
    ///
    /// Confirming a pending row expires its open invoice and issues the QR
    /// code. A registered row cannot be moved back to pending.
    pub async fn update_registration(
        &self,
        organizer_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        update: UpdateRegistrationRequest,
    ) -> Result<EventRegistration> {
        let event = self.load_event(event_id).await?;

        let permission = if update.status.is_some() { MANAGE_EVENTS } else { MANAGE_ATTENDANCE };
        require_permission(self.store.as_ref(), organizer_id, event.organization_id, permission).await?;

        if update.status.is_none() && update.attendance.is_none() {
            return Err(SyncUpError::InvalidInput("Nothing to update".to_string()));
        }

        let current = self
            .store
            .find_registration(event_id, user_id)
            .await?
            .ok_or(SyncUpError::RegistrationNotFound { event_id, user_id })?;

        let confirming = match (current.status, update.status) {
            (RegistrationStatus::Registered, Some(RegistrationStatus::Pending)) => {
                return Err(SyncUpError::InvalidInput(
                    "A confirmed registration cannot be moved back to pending".to_string(),
                ));
            }
            (RegistrationStatus::Pending, Some(RegistrationStatus::Registered)) => true,
            _ => false,
        };

        if confirming {
            if let Some(payment) = self.store.find_open_payment(event_id, user_id).await? {
                self.payments.cancel_payment(self.store.as_ref(), &payment).await;
            }
        }

        let mut registration = self
            .store
            .update_registration(event_id, user_id, update.clone())
            .await?
            .ok_or(SyncUpError::RegistrationNotFound { event_id, user_id })?;

        if registration.status == RegistrationStatus::Registered {
            registration.qr_code_data = self.qr.ensure_qr_code(self.store.as_ref(), &event, &registration).await?;
        }

        log_organizer_action(organizer_id, "update_registration", Some(&format!("{}:{}", event_id, user_id)));
        if let Some(attendance) = update.attendance {
            log_attendance_action(event_id, user_id, organizer_id, attendance.as_str());
        }

        Ok(registration)
    }
}
