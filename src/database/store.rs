//! Data access seam
//!
//! Services reach persistent data only through [`DataStore`]. The Postgres
//! implementation lives in [`crate::database::DatabaseService`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    CreateEventRequest, Event, EventRegistration, MemberAccess, NewActivity, NewNotification,
    NewPayment, NewRegistration, Notification, Payment, PaymentStatus, RegistrationRecord,
    UpdateEventRequest, UpdateRegistrationRequest, UserProfile,
};
use crate::utils::errors::Result;

/// Result of a capacity-checked registration insert
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(EventRegistration),
    /// A row for (event, user) already exists
    AlreadyRegistered(EventRegistration),
    /// The event holds `capacity` registrations already
    Full,
}

#[async_trait]
pub trait DataStore: Send + Sync {
    // events
    async fn create_event(&self, organization_id: Uuid, created_by: Uuid, request: CreateEventRequest) -> Result<Event>;
    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>>;
    async fn update_event(&self, event_id: Uuid, request: UpdateEventRequest) -> Result<Option<Event>>;
    async fn list_upcoming_events(&self, organization_id: Uuid, limit: i64) -> Result<Vec<Event>>;

    // registrations
    async fn find_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<EventRegistration>>;
    /// Registered plus pending rows
    async fn count_registrations(&self, event_id: Uuid) -> Result<i64>;
    /// Inserts unless the (event, user) row exists or the event is at capacity.
    /// The capacity check and the insert are atomic.
    async fn insert_registration(&self, registration: NewRegistration) -> Result<InsertOutcome>;
    /// Returns the number of rows removed (0 or 1)
    async fn delete_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<u64>;
    /// Writes QR data only when none is stored yet; returns the row as stored
    async fn set_qr_code(&self, event_id: Uuid, user_id: Uuid, qr_code_data: &str) -> Result<Option<EventRegistration>>;
    async fn update_registration(&self, event_id: Uuid, user_id: Uuid, update: UpdateRegistrationRequest) -> Result<Option<EventRegistration>>;
    async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationRecord>>;

    // members and permissions
    async fn find_member_access(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<MemberAccess>>;
    async fn has_permission(&self, user_id: Uuid, organization_id: Uuid, permission: &str) -> Result<bool>;
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>>;

    // payments
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment>;
    async fn find_payment_by_invoice(&self, invoice_id: &str) -> Result<Option<Payment>>;
    async fn find_open_payment(&self, target_id: Uuid, user_id: Uuid) -> Result<Option<Payment>>;
    async fn update_payment_status(&self, invoice_id: &str, status: PaymentStatus) -> Result<Option<Payment>>;

    // notifications and activity
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;
    async fn record_activity(&self, activity: NewActivity) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}
