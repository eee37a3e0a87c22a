//! SyncUp registration service
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use syncup::{
    config::Settings,
    database::{create_pool, run_migrations, DataStore, DatabaseService, PoolConfig},
    handlers::{router, AppState},
    middleware::RegistrationRateLimiter,
    services::{RealtimeHub, ServiceFactory},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", syncup::info());

    // Initialize database connection
    info!("Connecting to database...");
    let pool = create_pool(&PoolConfig::from(&settings.database)).await?;

    if settings.database.run_migrations {
        info!("Running database migrations...");
        run_migrations(&pool).await?;
    }

    let store: Arc<dyn DataStore> = Arc::new(DatabaseService::new(pool));

    // Realtime notifications are optional
    let realtime = match &settings.redis {
        Some(redis) => match RealtimeHub::connect(redis).await {
            Ok(hub) => {
                info!("Connected to Redis for realtime notifications");
                Some(hub)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, realtime notifications disabled");
                None
            }
        },
        None => None,
    };

    info!("Initializing services...");
    let services = ServiceFactory::new(&settings, store, realtime)?;
    let rate_limiter = RegistrationRateLimiter::new(&settings.rate_limit)?;

    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    let app = router(AppState::new(services, rate_limiter));

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "SyncUp is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SyncUp has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
