//! Database service layer
//!
//! This module provides the Postgres implementation of [`DataStore`] on top of
//! the individual repositories.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{
    ActivityRepository, DataStore, DatabasePool, EventRepository, InsertOutcome, MemberRepository,
    PaymentRepository, RegistrationRepository,
};
use crate::models::*;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub members: MemberRepository,
    pub payments: PaymentRepository,
    pub activity: ActivityRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            activity: ActivityRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl DataStore for DatabaseService {
    async fn create_event(&self, organization_id: Uuid, created_by: Uuid, request: CreateEventRequest) -> Result<Event> {
        self.events.create(organization_id, created_by, request).await
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>> {
        self.events.find_by_id(event_id).await
    }

    async fn update_event(&self, event_id: Uuid, request: UpdateEventRequest) -> Result<Option<Event>> {
        self.events.update(event_id, request).await
    }

    async fn list_upcoming_events(&self, organization_id: Uuid, limit: i64) -> Result<Vec<Event>> {
        self.events.get_upcoming_events(organization_id, limit).await
    }

    async fn find_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<EventRegistration>> {
        self.registrations.find(event_id, user_id).await
    }

    async fn count_registrations(&self, event_id: Uuid) -> Result<i64> {
        self.registrations.count(event_id).await
    }

    async fn insert_registration(&self, registration: NewRegistration) -> Result<InsertOutcome> {
        self.registrations.insert_with_capacity(registration).await
    }

    async fn delete_registration(&self, event_id: Uuid, user_id: Uuid) -> Result<u64> {
        self.registrations.delete(event_id, user_id).await
    }

    async fn set_qr_code(&self, event_id: Uuid, user_id: Uuid, qr_code_data: &str) -> Result<Option<EventRegistration>> {
        self.registrations.set_qr_code(event_id, user_id, qr_code_data).await
    }

    async fn update_registration(&self, event_id: Uuid, user_id: Uuid, update: UpdateRegistrationRequest) -> Result<Option<EventRegistration>> {
        self.registrations.update(event_id, user_id, update).await
    }

    async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationRecord>> {
        self.registrations.list_with_users(event_id).await
    }

    async fn find_member_access(&self, organization_id: Uuid, user_id: Uuid) -> Result<Option<MemberAccess>> {
        self.members.find_access(organization_id, user_id).await
    }

    async fn has_permission(&self, user_id: Uuid, organization_id: Uuid, permission: &str) -> Result<bool> {
        self.members.has_permission(user_id, organization_id, permission).await
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        self.members.find_user(user_id).await
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment> {
        self.payments.create(payment).await
    }

    async fn find_payment_by_invoice(&self, invoice_id: &str) -> Result<Option<Payment>> {
        self.payments.find_by_invoice(invoice_id).await
    }

    async fn find_open_payment(&self, target_id: Uuid, user_id: Uuid) -> Result<Option<Payment>> {
        self.payments.find_open(target_id, user_id).await
    }

    async fn update_payment_status(&self, invoice_id: &str, status: PaymentStatus) -> Result<Option<Payment>> {
        self.payments.update_status(invoice_id, status).await
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        self.activity.create_notification(notification).await
    }

    async fn record_activity(&self, activity: NewActivity) -> Result<()> {
        self.activity.record(activity).await
    }

    async fn health_check(&self) -> Result<()> {
        crate::database::health_check(&self.pool).await
    }
}
