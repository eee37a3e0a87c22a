//! Error handling for SyncUp
//!
//! This module defines the main error types used throughout the application
//! and how they are rendered as HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the SyncUp service
#[derive(Error, Debug)]
pub enum SyncUpError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Payment provider error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Registration not found for user {user_id} in event {event_id}")]
    RegistrationNotFound { event_id: Uuid, user_id: Uuid },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Payment provider specific errors
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invoice request failed: {0}")]
    RequestFailed(String),

    #[error("Payment provider timeout")]
    Timeout,

    #[error("Invalid payment provider response: {0}")]
    InvalidResponse(String),

    #[error("Payment provider unavailable")]
    ServiceUnavailable,

    #[error("Invalid callback token")]
    InvalidCallbackToken,
}

/// Result type alias for SyncUp operations
pub type Result<T> = std::result::Result<T, SyncUpError>;

/// Result type alias for payment provider operations
pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

impl SyncUpError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncUpError::Database(_) => false,
            SyncUpError::Migration(_) => false,
            SyncUpError::Payment(PaymentError::InvalidCallbackToken) => false,
            SyncUpError::Payment(_) => true,
            SyncUpError::Config(_) => false,
            SyncUpError::PermissionDenied(_) => false,
            SyncUpError::EventNotFound { .. } => false,
            SyncUpError::RegistrationNotFound { .. } => false,
            SyncUpError::UserNotFound { .. } => false,
            SyncUpError::InvalidStateTransition { .. } => false,
            SyncUpError::Redis(_) => true,
            SyncUpError::Http(_) => true,
            SyncUpError::Serialization(_) => false,
            SyncUpError::Io(_) => true,
            SyncUpError::UrlParse(_) => false,
            SyncUpError::Authentication(_) => false,
            SyncUpError::RateLimitExceeded => true,
            SyncUpError::InvalidInput(_) => false,
            SyncUpError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncUpError::Database(_) => ErrorSeverity::Critical,
            SyncUpError::Migration(_) => ErrorSeverity::Critical,
            SyncUpError::Config(_) => ErrorSeverity::Critical,
            SyncUpError::PermissionDenied(_) => ErrorSeverity::Warning,
            SyncUpError::Authentication(_) => ErrorSeverity::Warning,
            SyncUpError::RateLimitExceeded => ErrorSeverity::Warning,
            SyncUpError::InvalidInput(_) => ErrorSeverity::Info,
            SyncUpError::EventNotFound { .. } => ErrorSeverity::Info,
            SyncUpError::RegistrationNotFound { .. } => ErrorSeverity::Info,
            SyncUpError::UserNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status used when the error reaches a handler boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncUpError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            SyncUpError::Authentication(_) => StatusCode::UNAUTHORIZED,
            SyncUpError::Payment(PaymentError::InvalidCallbackToken) => StatusCode::UNAUTHORIZED,
            SyncUpError::EventNotFound { .. }
            | SyncUpError::RegistrationNotFound { .. }
            | SyncUpError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            SyncUpError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SyncUpError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            SyncUpError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            SyncUpError::Payment(_) => StatusCode::BAD_GATEWAY,
            SyncUpError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            SyncUpError::PermissionDenied(_) => "permission_denied",
            SyncUpError::Authentication(_) => "unauthorized",
            SyncUpError::Payment(PaymentError::InvalidCallbackToken) => "unauthorized",
            SyncUpError::Payment(_) => "payment_provider_error",
            SyncUpError::EventNotFound { .. } => "event_not_found",
            SyncUpError::RegistrationNotFound { .. } => "registration_not_found",
            SyncUpError::UserNotFound { .. } => "user_not_found",
            SyncUpError::InvalidInput(_) => "invalid_input",
            SyncUpError::InvalidStateTransition { .. } => "invalid_state",
            SyncUpError::RateLimitExceeded => "rate_limited",
            SyncUpError::ServiceUnavailable(_) => "service_unavailable",
            _ => "internal_error",
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Something went wrong. Please try again.".to_string(),
            StatusCode::BAD_GATEWAY => "The payment provider could not be reached. Please try again.".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for SyncUpError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(error = %self, severity = %self.severity(), recoverable = self.is_recoverable(), "Request failed");
            }
            ErrorSeverity::Warning => tracing::warn!(error = %self, "Request rejected"),
            ErrorSeverity::Info => tracing::debug!(error = %self, "Request rejected"),
        }

        let body = serde_json::json!({
            "error": self.code(),
            "message": self.public_message(),
        });

        (status, Json(body)).into_response()
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
