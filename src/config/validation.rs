//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use url::Url;

use super::Settings;
use crate::services::attendance::MAX_LATE_AFTER_MINUTES;
use crate::utils::errors::{Result, SyncUpError};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_payments_config(&settings.payments)?;
    validate_site_config(&settings.site)?;
    validate_logging_config(&settings.logging)?;

    if let Some(ref redis_config) = settings.redis {
        validate_redis_config(redis_config)?;
    }

    if settings.rate_limit.registrations_per_minute == 0 {
        return Err(SyncUpError::Config(
            "Registration rate limit must be greater than 0".to_string(),
        ));
    }

    if settings.attendance.late_after_minutes < 0 {
        return Err(SyncUpError::Config(
            "Late threshold cannot be negative".to_string(),
        ));
    }

    if settings.attendance.late_after_minutes > MAX_LATE_AFTER_MINUTES {
        return Err(SyncUpError::Config(format!(
            "Late threshold cannot exceed {} minutes",
            MAX_LATE_AFTER_MINUTES
        )));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(SyncUpError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(SyncUpError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(SyncUpError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate access token settings
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(SyncUpError::Config("JWT secret is required".to_string()));
    }

    if config.audience.is_empty() {
        return Err(SyncUpError::Config("JWT audience is required".to_string()));
    }

    Ok(())
}

/// Validate payment provider configuration
fn validate_payments_config(config: &super::PaymentsConfig) -> Result<()> {
    Url::parse(&config.api_url)
        .map_err(|e| SyncUpError::Config(format!("Invalid payment API URL: {}", e)))?;

    if config.secret_key.is_empty() {
        return Err(SyncUpError::Config(
            "Payment provider secret key is required".to_string(),
        ));
    }

    if config.callback_token.is_empty() {
        return Err(SyncUpError::Config(
            "Payment callback token is required".to_string(),
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(SyncUpError::Config(
            "Payment timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate public site URLs
fn validate_site_config(config: &super::SiteConfig) -> Result<()> {
    Url::parse(&config.url)
        .map_err(|e| SyncUpError::Config(format!("Invalid site URL: {}", e)))?;
    Url::parse(&config.storage_url)
        .map_err(|e| SyncUpError::Config(format!("Invalid storage URL: {}", e)))?;

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(SyncUpError::Config("Redis URL is required".to_string()));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(SyncUpError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(SyncUpError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
