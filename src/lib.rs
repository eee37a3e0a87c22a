//! SyncUp registration service
//!
//! Server side of the SyncUp event workflow: organizations publish events,
//! members register (paying onsite or online when a fee applies), organizers
//! track attendance by QR scan and export registrations as CSV.

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, SyncUpError};

// Re-export main components for easy access
pub use database::{DataStore, DatabaseService};
pub use handlers::{router, AppState};
pub use services::ServiceFactory;
pub use state::{FlowState, RegistrationFlow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
