//! Test Redis helper
//!
//! `TEST_REDIS_URL` when set, otherwise a throwaway testcontainers instance.
//! Tests that need Redis skip when neither is available.

use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::{Redis as RedisImage, REDIS_PORT};
use uuid::Uuid;

use syncup::config::RedisConfig;
use syncup::services::RealtimeHub;

pub struct TestRedis {
    pub url: String,
    _container: Option<ContainerAsync<RedisImage>>,
}

impl TestRedis {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let (url, container) = match std::env::var("TEST_REDIS_URL") {
            Ok(url) => (url, None),
            Err(_) => {
                let container = RedisImage::default().start().await?;
                let port = container.get_host_port_ipv4(REDIS_PORT).await?;
                (format!("redis://127.0.0.1:{}", port), Some(container))
            }
        };

        Ok(Self {
            url,
            _container: container,
        })
    }

    /// Redis for a test, or `None` (with a note) when Redis is unavailable
    pub async fn try_new() -> Option<Self> {
        match Self::new().await {
            Ok(redis) => Some(redis),
            Err(e) => {
                eprintln!("skipping: Redis unavailable ({})", e);
                None
            }
        }
    }

    /// Config with a per-test channel prefix
    pub fn config(&self) -> RedisConfig {
        RedisConfig {
            url: self.url.clone(),
            prefix: format!("test-{}:", Uuid::new_v4().simple()),
        }
    }

    pub async fn hub(&self) -> Option<RealtimeHub> {
        match RealtimeHub::connect(&self.config()).await {
            Ok(hub) => Some(hub),
            Err(e) => {
                eprintln!("skipping: Redis connection failed ({})", e);
                None
            }
        }
    }
}
