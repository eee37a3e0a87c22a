//! Realtime notification stream

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Extension;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::handlers::AppState;
use crate::services::AuthenticatedUser;
use crate::utils::errors::{Result, SyncUpError};

/// GET /api/notifications/stream
pub async fn stream(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>> {
    let hub = state
        .services
        .notification_service
        .realtime()
        .ok_or_else(|| SyncUpError::ServiceUnavailable("realtime notifications are not configured".to_string()))?;

    let mut messages = hub.subscribe(user.user_id).await?;
    let user_id = user.user_id;

    let events = async_stream::stream! {
        while let Some(payload) = messages.next().await {
            yield Ok::<_, Infallible>(SseEvent::default().event("notification").data(payload));
        }
        debug!(user_id = %user_id, "Notification stream closed");
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
