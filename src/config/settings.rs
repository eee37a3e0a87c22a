//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub site: SiteConfig,
    pub attendance: AttendanceConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

/// Redis configuration (realtime notifications)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
}

/// Access token verification for the hosted auth provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub audience: String,
}

/// Payment provider (invoice API) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    pub api_url: String,
    pub secret_key: String,
    pub callback_token: String,
    pub currency: String,
    pub timeout_seconds: u64,
    pub invoice_duration_seconds: u64,
}

/// Public URLs of the web application and object storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub url: String,
    pub storage_url: String,
}

/// Attendance rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttendanceConfig {
    pub late_after_minutes: i64,
}

/// Per-user request limits on registration endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub registrations_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_sources("config")
    }

    /// Load settings from the given file (extension optional) and the environment
    pub fn from_sources(file: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("SYNCUP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SyncUpError> {
        super::validation::validate_settings(self)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/syncup".to_string(),
                max_connections: 10,
                min_connections: 1,
                run_migrations: true,
            },
            redis: None,
            auth: AuthConfig {
                jwt_secret: String::new(),
                audience: "authenticated".to_string(),
            },
            payments: PaymentsConfig {
                api_url: "https://api.xendit.co".to_string(),
                secret_key: String::new(),
                callback_token: String::new(),
                currency: "PHP".to_string(),
                timeout_seconds: 10,
                invoice_duration_seconds: 86_400,
            },
            site: SiteConfig {
                url: "http://localhost:3000".to_string(),
                storage_url: "http://localhost:54321".to_string(),
            },
            attendance: AttendanceConfig {
                late_after_minutes: 15,
            },
            rate_limit: RateLimitConfig {
                registrations_per_minute: 20,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
                json: false,
            },
        }
    }
}
