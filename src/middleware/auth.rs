//! Authentication middleware
//!
//! Verifies the bearer access token on every protected route and stores the
//! caller in the request extensions for handlers to pick up.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::handlers::AppState;
use crate::services::AuthService;
use crate::utils::errors::SyncUpError;

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, SyncUpError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok());

    let token = AuthService::bearer_token(header_value)?;
    let user = state.services.auth_service.verify(token)?;

    tracing::Span::current().record("user_id", tracing::field::display(user.user_id));
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
