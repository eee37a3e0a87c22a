//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the SyncUp service.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::utils::errors::{Result, SyncUpError};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer and must live as long as the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match config.directory {
        Some(ref directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "syncup.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SyncUpError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration workflow actions
pub fn log_registration_action(event_id: Uuid, user_id: Uuid, action: &str, details: Option<&str>) {
    info!(
        event_id = %event_id,
        user_id = %user_id,
        action = action,
        details = details,
        "Registration action performed"
    );
}

/// Log a rejected registration attempt
pub fn log_registration_rejected(event_id: Uuid, user_id: Uuid, reason: &str) {
    info!(
        event_id = %event_id,
        user_id = %user_id,
        reason = reason,
        "Registration rejected"
    );
}

/// Log payment lifecycle events
pub fn log_payment_event(invoice_id: &str, event: &str, amount: Option<i64>) {
    info!(
        invoice_id = invoice_id,
        event = event,
        amount = amount,
        "Payment event occurred"
    );
}

/// Log attendance changes made by organizers or scans
pub fn log_attendance_action(event_id: Uuid, user_id: Uuid, marked_by: Uuid, attendance: &str) {
    info!(
        event_id = %event_id,
        user_id = %user_id,
        marked_by = %marked_by,
        attendance = attendance,
        "Attendance recorded"
    );
}

/// Log organizer actions on events
pub fn log_organizer_action(organizer_id: Uuid, action: &str, target: Option<&str>) {
    warn!(
        organizer_id = %organizer_id,
        action = action,
        target = target,
        "Organizer action performed"
    );
}

/// Log failed calls to external services with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
