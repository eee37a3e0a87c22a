//! In-memory DataStore
//!
//! Mirrors the Postgres store closely enough to drive the workflow and the
//! router without a database. A single mutex makes capacity checks atomic,
//! like the row lock does in Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use syncup::database::{DataStore, InsertOutcome};
use syncup::models::{
    Attendance, CreateEventRequest, Event, EventRegistration, MemberAccess, NewActivity,
    NewNotification, NewPayment, NewRegistration, Notification, Payment, PaymentStatus,
    RegistrationRecord, RegistrationStatus, UpdateEventRequest, UpdateRegistrationRequest,
    UserProfile,
};
use syncup::{Result, SyncUpError};

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    registrations: Vec<EventRegistration>,
    members: Vec<MemberAccess>,
    permissions: HashSet<(Uuid, Uuid, String)>,
    users: HashMap<Uuid, UserProfile>,
    payments: Vec<Payment>,
    notifications: Vec<Notification>,
    activities: Vec<NewActivity>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_payment_insert: AtomicBool,
    fail_notifications: AtomicBool,
    failing_registration_updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&self, event: Event) {
        self.inner.lock().unwrap().events.insert(event.id, event);
    }

    pub fn add_user(&self, user: UserProfile) {
        self.inner.lock().unwrap().users.insert(user.id, user);
    }

    pub fn add_member(&self, member: MemberAccess) {
        self.inner.lock().unwrap().members.push(member);
    }

    pub fn grant(&self, user_id: Uuid, organization_id: Uuid, permission: &str) {
        self.inner
            .lock()
            .unwrap()
            .permissions
            .insert((user_id, organization_id, permission.to_string()));
    }

    pub fn set_fail_payment_insert(&self, fail: bool) {
        self.fail_payment_insert.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Fail the next `count` registration updates
    pub fn fail_registration_updates(&self, count: usize) {
        self.failing_registration_updates.store(count, Ordering::SeqCst);
    }

    /// Seed a row directly, bypassing the workflow
    pub fn add_registration(&self, event_id: Uuid, user_id: Uuid, status: RegistrationStatus) {
        let now = Utc::now();
        self.inner.lock().unwrap().registrations.push(EventRegistration {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status,
            attendance: None,
            qr_code_data: None,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn registrations_for(&self, event_id: Uuid) -> Vec<EventRegistration> {
        self.inner
            .lock()
            .unwrap()
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.inner.lock().unwrap().payments.clone()
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn activity_actions(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .activities
            .iter()
            .map(|a| a.action.clone())
            .collect()
    }

    /// Backdate a registration for ordering tests
    pub fn set_registered_at(&self, event_id: Uuid, user_id: Uuid, at: chrono::DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner
            .registrations
            .iter_mut()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
        {
            r.created_at = at;
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn create_event(&self, organization_id: Uuid, created_by: Uuid, request: CreateEventRequest) -> Result<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organization_id,
            title: request.title,
            description: request.description,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            location: request.location,
            capacity: request.capacity,
            registration_fee: request.registration_fee,
            onsite: request.onsite,
            privacy: request.privacy,
            photo_path: request.photo_path,
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };
        self.add_event(event.clone());
        Ok(event)
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>> {
        Ok(self.inner.lock().unwrap().events.get(&event_id).cloned())
    }

    async fn update_event(&self, event_id: Uuid, request: UpdateEventRequest) -> Result<Option<Event>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(event) = inner.events.get_mut(&event_id) else {
            return Ok(None);
        };

        if let Some(title) = request.title {
            event.title = title;
        }
        if let Some(description) = request.description {
            event.description = Some(description);
        }
        if let Some(starts_at) = request.starts_at {
            event.starts_at = starts_at;
        }
        if let Some(ends_at) = request.ends_at {
            event.ends_at = ends_at;
        }
        if let Some(location) = request.location {
            event.location = Some(location);
        }
        if let Some(capacity) = request.capacity {
            event.capacity = Some(capacity);
        }
        if let Some(fee) = request.registration_fee {
            event.registration_fee = fee;
        }
        if let Some(onsite) = request.onsite {
            event.onsite = onsite;
        }
        if let Some(privacy) = request.privacy {
            event.privacy = privacy;
        }
        if let Some(photo_path) = request.photo_path {
            event.photo_path = Some(photo_path);
        }
        event.updated_at = Utc::now();

        Ok(Some(event.clone()))
    }

    async fn list_upcoming_events(&self, organization_id: Uuid, limit: i64) -> Result<Vec<Event>> {
        let now = Utc::now();
        let mut events: Vec<Event> = self
            .inner
            .lock()
            .unwrap()
            .events
            .values()
            .filter(|e| e.organization_id == organization_id && e.ends_at > now)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.starts_at);
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn find_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<EventRegistration>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .registrations
            .iter()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned())
    }

    async fn count_registrations(&self, event_id: Uuid) -> Result<i64> {
        Ok(self.registrations_for(event_id).len() as i64)
    }

    async fn insert_registration(&self, registration: NewRegistration) -> Result<InsertOutcome> {
        let mut inner = self.inner.lock().unwrap();
        let capacity = inner
            .events
            .get(&registration.event_id)
            .ok_or(SyncUpError::EventNotFound { event_id: registration.event_id })?
            .capacity;

        if let Some(existing) = inner
            .registrations
            .iter()
            .find(|r| r.event_id == registration.event_id && r.user_id == registration.user_id)
        {
            return Ok(InsertOutcome::AlreadyRegistered(existing.clone()));
        }

        let count = inner
            .registrations
            .iter()
            .filter(|r| r.event_id == registration.event_id)
            .count() as i64;
        if let Some(capacity) = capacity {
            if count >= capacity as i64 {
                return Ok(InsertOutcome::Full);
            }
        }

        let now = Utc::now();
        let row = EventRegistration {
            id: Uuid::new_v4(),
            event_id: registration.event_id,
            user_id: registration.user_id,
            status: registration.status,
            attendance: None,
            qr_code_data: None,
            created_at: now,
            updated_at: now,
        };
        inner.registrations.push(row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn delete_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.registrations.len();
        inner
            .registrations
            .retain(|r| !(r.event_id == event_id && r.user_id == user_id));
        Ok((before - inner.registrations.len()) as u64)
    }

    async fn set_qr_code(&self, event_id: Uuid, user_id: Uuid, qr_code_data: &str) -> Result<Option<EventRegistration>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner
            .registrations
            .iter_mut()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
        else {
            return Ok(None);
        };

        if row.qr_code_data.is_none() {
            row.qr_code_data = Some(qr_code_data.to_string());
            row.updated_at = Utc::now();
        }
        Ok(Some(row.clone()))
    }

    async fn update_registration(&self, event_id: Uuid, user_id: Uuid, update: UpdateRegistrationRequest) -> Result<Option<EventRegistration>> {
        let failing = self
            .failing_registration_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(SyncUpError::ServiceUnavailable("registrations table unavailable".to_string()));
        }

        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner
            .registrations
            .iter_mut()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(status) = update.status {
            row.status = status;
        }
        if let Some(attendance) = update.attendance {
            row.attendance = Some(attendance);
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<RegistrationRecord> = inner
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .filter_map(|r| {
                inner.users.get(&r.user_id).map(|u| RegistrationRecord {
                    registration: r.clone(),
                    first_name: u.first_name.clone(),
                    last_name: u.last_name.clone(),
                    email: u.email.clone(),
                })
            })
            .collect();
        rows.sort_by_key(|r| r.registration.created_at);
        Ok(rows)
    }

    async fn find_member_access(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<MemberAccess>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .members
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn has_permission(&self, user_id: Uuid, organization_id: Uuid, permission: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.permissions.contains(&(user_id, organization_id, permission.to_string()))
            || inner.permissions.contains(&(user_id, organization_id, "all".to_string())))
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.inner.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment> {
        if self.fail_payment_insert.load(Ordering::SeqCst) {
            return Err(SyncUpError::ServiceUnavailable("payments table unavailable".to_string()));
        }

        let now = Utc::now();
        let row = Payment {
            id: Uuid::new_v4(),
            invoice_id: payment.invoice_id,
            invoice_url: payment.invoice_url,
            external_id: payment.external_id,
            amount: payment.amount,
            status: PaymentStatus::Pending,
            target_type: payment.target_type,
            target_id: payment.target_id,
            organization_id: payment.organization_id,
            user_id: payment.user_id,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().payments.push(row.clone());
        Ok(row)
    }

    async fn find_payment_by_invoice(&self, invoice_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .payments
            .iter()
            .find(|p| p.invoice_id == invoice_id)
            .cloned())
    }

    async fn find_open_payment(&self, target_id: Uuid, user_id: Uuid) -> Result<Option<Payment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .payments
            .iter()
            .rev()
            .find(|p| p.target_id == target_id && p.user_id == user_id && p.status == PaymentStatus::Pending)
            .cloned())
    }

    async fn update_payment_status(&self, invoice_id: &str, status: PaymentStatus) -> Result<Option<Payment>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.payments.iter_mut().find(|p| p.invoice_id == invoice_id) else {
            return Ok(None);
        };
        row.status = status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(SyncUpError::ServiceUnavailable("notifications table unavailable".to_string()));
        }

        let row = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: notification.title,
            body: notification.body,
            read: false,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().notifications.push(row.clone());
        Ok(row)
    }

    async fn record_activity(&self, activity: NewActivity) -> Result<()> {
        self.inner.lock().unwrap().activities.push(activity);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Attendance of a stored registration
pub fn attendance_of(store: &MemoryStore, event_id: Uuid, user_id: Uuid) -> Option<Attendance> {
    store
        .registrations_for(event_id)
        .into_iter()
        .find(|r| r.user_id == user_id)
        .and_then(|r| r.attendance)
}

/// Status of a stored registration
pub fn status_of(store: &MemoryStore, event_id: Uuid, user_id: Uuid) -> Option<RegistrationStatus> {
    store
        .registrations_for(event_id)
        .into_iter()
        .find(|r| r.user_id == user_id)
        .map(|r| r.status)
}
