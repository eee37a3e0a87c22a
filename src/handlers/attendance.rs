//! Attendance handlers

use axum::extract::State;
use axum::{Extension, Json};

use crate::handlers::AppState;
use crate::services::attendance::{ScanRequest, ScanResult};
use crate::services::AuthenticatedUser;
use crate::utils::errors::Result;

/// POST /api/attendance/scan
pub async fn scan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResult>> {
    let result = state
        .services
        .attendance_service
        .scan(user.user_id, &request.qr_code_data)
        .await?;

    Ok(Json(result))
}
