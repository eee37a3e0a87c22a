//! Services module
//!
//! This module contains business logic services

pub mod attendance;
pub mod auth;
pub mod eligibility;
pub mod event;
pub mod export;
pub mod notification;
pub mod payment;
pub mod permission;
pub mod qr;
pub mod registration;
pub mod storage;

// Re-export commonly used services
pub use attendance::AttendanceService;
pub use auth::{AuthService, AuthenticatedUser};
pub use eligibility::{Eligibility, Rejection};
pub use event::EventService;
pub use notification::{NotificationService, RealtimeHub};
pub use payment::PaymentClient;
pub use qr::QrService;
pub use registration::RegistrationService;
pub use storage::{StorageBucket, StorageUrls};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::DataStore;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub store: Arc<dyn DataStore>,
    pub auth_service: AuthService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub attendance_service: AttendanceService,
    pub notification_service: NotificationService,
    pub payment_client: PaymentClient,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, store: Arc<dyn DataStore>, realtime: Option<RealtimeHub>) -> Result<Self> {
        let payment_client = PaymentClient::new(&settings.payments)?;
        let notification_service = NotificationService::new(store.clone(), realtime);
        let qr = QrService::new(&settings.site.url);
        let storage = StorageUrls::new(&settings.site.storage_url);

        let registration_service = RegistrationService::new(
            store.clone(),
            payment_client.clone(),
            qr.clone(),
            notification_service.clone(),
            &settings.site.url,
        );
        let event_service = EventService::new(store.clone(), storage, notification_service.clone());
        let attendance_service = AttendanceService::new(
            store.clone(),
            payment_client.clone(),
            qr,
            notification_service.clone(),
            settings.attendance.late_after_minutes,
        );

        Ok(Self {
            store,
            auth_service: AuthService::new(&settings.auth),
            event_service,
            registration_service,
            attendance_service,
            notification_service,
            payment_client,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = match self.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Store health check failed");
                false
            }
        };

        ServiceHealthStatus {
            database_healthy,
            realtime_enabled: self.notification_service.realtime().is_some(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub realtime_enabled: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }
}
