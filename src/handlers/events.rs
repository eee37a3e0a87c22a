//! Event handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::debug;
use uuid::Uuid;

use crate::handlers::AppState;
use crate::models::{CreateEventRequest, Event, UpdateEventRequest};
use crate::services::event::{EventDetail, EventSummary};
use crate::services::registration::EligibilityReport;
use crate::services::AuthenticatedUser;
use crate::utils::errors::Result;

/// GET /api/organizations/:org_id/events
pub async fn list_events(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> Result<Json<Vec<EventSummary>>> {
    let events = state.services.event_service.list_upcoming(org_id).await?;
    Ok(Json(events))
}

/// POST /api/organizations/:org_id/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(org_id): Path<Uuid>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = state
        .services
        .event_service
        .create_event(user.user_id, org_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /api/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetail>> {
    let detail = state.services.event_service.event_detail(event_id, user.user_id).await?;
    Ok(Json(detail))
}

/// PATCH /api/events/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<Event>> {
    let event = state
        .services
        .event_service
        .update_event(user.user_id, event_id, request)
        .await?;

    Ok(Json(event))
}

/// GET /api/events/:event_id/eligibility
pub async fn eligibility(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EligibilityReport>> {
    let report = state
        .services
        .registration_service
        .eligibility(event_id, user.user_id)
        .await?;

    debug!(event_id = %event_id, user_id = %user.user_id, eligible = report.eligible, "Eligibility checked");
    Ok(Json(report))
}
