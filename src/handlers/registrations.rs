//! Registration handlers

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::handlers::AppState;
use crate::models::{EventRegistration, RegistrationRecord, UpdateRegistrationRequest};
use crate::services::export::{export_filename, registrations_csv};
use crate::services::registration::{RegisterRequest, RegistrationOutcome, UnregisterOutcome};
use crate::services::AuthenticatedUser;
use crate::utils::errors::Result;

/// Status code for a registration outcome
pub fn outcome_status(outcome: &RegistrationOutcome) -> StatusCode {
    match outcome.rejection() {
        Some(reason) if reason.is_access_denial() => StatusCode::FORBIDDEN,
        Some(_) => StatusCode::CONFLICT,
        None => StatusCode::OK,
    }
}

/// POST /api/events/:event_id/registrations
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
    body: Option<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<RegistrationOutcome>)> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let outcome = state
        .services
        .registration_service
        .register(event_id, user.user_id, request)
        .await?;

    Ok((outcome_status(&outcome), Json(outcome)))
}

/// DELETE /api/events/:event_id/registrations
pub async fn unregister(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<UnregisterOutcome>> {
    let outcome = state
        .services
        .registration_service
        .unregister(event_id, user.user_id)
        .await?;

    Ok(Json(outcome))
}

/// GET /api/events/:event_id/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<RegistrationRecord>>> {
    let (_, records) = state
        .services
        .event_service
        .list_registrations(user.user_id, event_id)
        .await?;

    Ok(Json(records))
}

/// GET /api/events/:event_id/registrations/export
pub async fn export_registrations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Response> {
    let (event, records) = state
        .services
        .event_service
        .list_registrations(user.user_id, event_id)
        .await?;

    let csv = registrations_csv(&records);
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&event));

    let mut response = csv.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// PATCH /api/events/:event_id/registrations/:user_id
pub async fn update_registration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((event_id, attendee_id)): Path<(Uuid, Uuid)>,
    Json(update): Json<UpdateRegistrationRequest>,
) -> Result<Json<EventRegistration>> {
    let registration = state
        .services
        .attendance_service
        .update_registration(user.user_id, event_id, attendee_id, update)
        .await?;

    Ok(Json(registration))
}
