//! Rate limiting middleware
//!
//! Registration requests are limited per user with a keyed `governor`
//! limiter. Requests without an authenticated user are passed through; the
//! auth layer rejects them first.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;
use uuid::Uuid;

use crate::config::RateLimitConfig;
use crate::handlers::AppState;
use crate::services::AuthenticatedUser;
use crate::utils::errors::{Result, SyncUpError};

/// Per-user limiter for registration writes
#[derive(Clone)]
pub struct RegistrationRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<Uuid>>,
}

impl RegistrationRateLimiter {
    /// Create a new RegistrationRateLimiter instance
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.registrations_per_minute)
            .ok_or_else(|| SyncUpError::Config("rate_limit.registrations_per_minute must be positive".to_string()))?;

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
        })
    }

    /// Check if user is rate limited
    pub fn check(&self, user_id: Uuid) -> Result<()> {
        self.limiter.check_key(&user_id).map_err(|_| {
            warn!(user_id = %user_id, "Registration rate limit exceeded");
            SyncUpError::RateLimitExceeded
        })
    }

    /// Drop state for keys that are back at full capacity
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
    }
}

pub async fn limit_registrations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, SyncUpError> {
    if let Some(user) = request.extensions().get::<AuthenticatedUser>() {
        state.rate_limiter.check(user.user_id)?;
    }

    Ok(next.run(request).await)
}
