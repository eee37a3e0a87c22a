//! Test context for unified test setup
//!
//! Wires the in-memory store and the mock payment provider into a full
//! [`ServiceFactory`] and router, the same way `main` wires Postgres.

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use syncup::config::Settings;
use syncup::database::DataStore;
use syncup::handlers::{router, AppState};
use syncup::middleware::RegistrationRateLimiter;
use syncup::models::{Event, UserProfile};
use syncup::services::{RealtimeHub, ServiceFactory};

use super::memory_store::MemoryStore;
use super::payments_mock::PaymentsMockServer;
use super::test_data::{
    create_test_member, create_test_user, TEST_AUDIENCE, TEST_CALLBACK_TOKEN, TEST_JWT_SECRET, TEST_SITE_URL,
};

/// Unified test context that manages all test components
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub payments: PaymentsMockServer,
    pub settings: Settings,
    pub services: ServiceFactory,
    pub organization_id: Uuid,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_realtime(None).await
    }

    /// Context whose notifications also fan out through `realtime`
    pub async fn with_realtime(realtime: Option<RealtimeHub>) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let payments = PaymentsMockServer::new().await;
        let settings = create_test_settings(&payments.api_url());
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn DataStore> = store.clone();

        let services = ServiceFactory::new(&settings, dyn_store, realtime).expect("Failed to create services");

        Self {
            store,
            payments,
            settings,
            services,
            organization_id: Uuid::new_v4(),
        }
    }

    /// Router over this context's services
    pub fn app(&self) -> Router {
        let rate_limiter =
            RegistrationRateLimiter::new(&self.settings.rate_limit).expect("Failed to create rate limiter");
        router(AppState::new(self.services.clone(), rate_limiter))
    }

    pub fn add_event(&self, event: Event) -> Event {
        self.store.add_event(event.clone());
        event
    }

    pub fn add_user(&self) -> UserProfile {
        let user = create_test_user();
        self.store.add_user(user.clone());
        user
    }

    /// User who is a member of the context organization
    pub fn add_member(&self, roles: &[&str], tier: Option<&str>) -> UserProfile {
        let user = self.add_user();
        self.store
            .add_member(create_test_member(self.organization_id, user.id, roles, tier));
        user
    }

    /// Member holding the given organization permissions
    pub fn add_organizer(&self, permissions: &[&str]) -> UserProfile {
        let user = self.add_member(&["admin"], None);
        for permission in permissions {
            self.store.grant(user.id, self.organization_id, permission);
        }
        user
    }
}

/// Settings pointing at the mock payment provider
pub fn create_test_settings(payments_api_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    settings.auth.audience = TEST_AUDIENCE.to_string();
    settings.payments.api_url = payments_api_url.to_string();
    settings.payments.secret_key = "xnd_test_secret".to_string();
    settings.payments.callback_token = TEST_CALLBACK_TOKEN.to_string();
    settings.payments.timeout_seconds = 2;
    settings.site.url = TEST_SITE_URL.to_string();
    settings.site.storage_url = "https://storage.syncup.test".to_string();
    settings
}
