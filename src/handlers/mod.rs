//! HTTP handlers module
//!
//! This module contains the axum handlers organized by resource:
//! - Event handlers for listing, detail, management and eligibility
//! - Registration handlers for registering, organizer views and exports
//! - Attendance, payment webhook and realtime notification handlers

pub mod attendance;
pub mod events;
pub mod notifications;
pub mod registrations;
pub mod webhooks;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::middleware::{limit_registrations, log_requests, require_auth, trace_layer, RegistrationRateLimiter};
use crate::services::ServiceFactory;

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceFactory,
    pub rate_limiter: RegistrationRateLimiter,
}

impl AppState {
    pub fn new(services: ServiceFactory, rate_limiter: RegistrationRateLimiter) -> Self {
        Self { services, rate_limiter }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/organizations/:org_id/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/api/events/:event_id",
            get(events::get_event).patch(events::update_event),
        )
        .route("/api/events/:event_id/eligibility", get(events::eligibility))
        .route(
            "/api/events/:event_id/registrations",
            get(registrations::list_registrations).merge(
                post(registrations::register)
                    .delete(registrations::unregister)
                    .route_layer(middleware::from_fn_with_state(state.clone(), limit_registrations)),
            ),
        )
        .route(
            "/api/events/:event_id/registrations/export",
            get(registrations::export_registrations),
        )
        .route(
            "/api/events/:event_id/registrations/:user_id",
            patch(registrations::update_registration),
        )
        .route("/api/attendance/scan", post(attendance::scan))
        .route("/api/notifications/stream", get(notifications::stream))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/webhooks/payments", post(webhooks::payment_callback))
        .merge(protected)
        .layer(middleware::from_fn(log_requests))
        .layer(trace_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness plus store check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}
