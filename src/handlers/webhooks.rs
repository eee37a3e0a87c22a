//! Payment provider webhook

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::handlers::AppState;
use crate::services::payment::InvoiceCallback;
use crate::utils::errors::Result;

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// POST /api/webhooks/payments
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(callback): Json<InvoiceCallback>,
) -> Result<Json<Value>> {
    let token = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    state.services.payment_client.verify_callback_token(token)?;

    let result = state
        .services
        .registration_service
        .handle_payment_callback(callback)
        .await?;

    Ok(Json(json!({ "received": true, "result": result })))
}
