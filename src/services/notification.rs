//! Notification service implementation
//!
//! Notifications are stored for the user and, when Redis is configured,
//! published on a per-user channel that feeds the realtime stream. Delivery
//! failures are logged and swallowed: a registration never fails because a
//! notification could not be written.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::RedisConfig;
use crate::database::DataStore;
use crate::models::{Event, NewActivity, NewNotification, Notification};
use crate::utils::errors::{Result, SyncUpError};
use crate::utils::helpers::truncate_text;

const MAX_BODY_CHARS: usize = 280;

/// Redis pub/sub fan-out of notifications
#[derive(Clone)]
pub struct RealtimeHub {
    client: Client,
    publisher: ConnectionManager,
    prefix: String,
}

impl RealtimeHub {
    /// Connect to Redis and keep a managed publishing connection
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(SyncUpError::Redis)?;
        let publisher = client.get_connection_manager().await.map_err(SyncUpError::Redis)?;

        Ok(Self {
            client,
            publisher,
            prefix: config.prefix.clone(),
        })
    }

    pub fn channel(&self, user_id: Uuid) -> String {
        notification_channel(&self.prefix, user_id)
    }

    /// Publish a notification to the user's channel
    pub async fn publish(&self, notification: &Notification) -> Result<()> {
        let channel = self.channel(notification.user_id);
        let payload = serde_json::to_string(notification)?;
        let mut conn = self.publisher.clone();

        let receivers: i64 = conn.publish(&channel, payload).await?;
        debug!(channel = %channel, receivers = receivers, "Notification published");
        Ok(())
    }

    /// Stream of raw JSON notifications published for the user
    pub async fn subscribe(&self, user_id: Uuid) -> Result<BoxStream<'static, String>> {
        let channel = self.channel(user_id);
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(&channel).await?;
        debug!(channel = %channel, "Subscribed to notifications");

        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                match msg.get_payload::<String>() {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        warn!(error = %e, "Dropping undecodable notification payload");
                        None
                    }
                }
            });

        Ok(stream.boxed())
    }
}

/// `<prefix>realtime:notifications:<userId>`
pub fn notification_channel(prefix: &str, user_id: Uuid) -> String {
    format!("{}realtime:notifications:{}", prefix, user_id)
}

/// Best-effort notifications and activity log
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn DataStore>,
    realtime: Option<RealtimeHub>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(store: Arc<dyn DataStore>, realtime: Option<RealtimeHub>) -> Self {
        Self { store, realtime }
    }

    pub fn realtime(&self) -> Option<&RealtimeHub> {
        self.realtime.as_ref()
    }

    /// Store a notification and push it to connected clients
    pub async fn notify(&self, user_id: Uuid, title: &str, body: &str) {
        let new = NewNotification {
            user_id,
            title: title.to_string(),
            body: truncate_text(body, MAX_BODY_CHARS),
        };

        let notification = match self.store.insert_notification(new).await {
            Ok(notification) => notification,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to store notification");
                return;
            }
        };

        if let Some(hub) = &self.realtime {
            if let Err(e) = hub.publish(&notification).await {
                warn!(user_id = %user_id, error = %e, "Failed to publish notification");
            }
        }
    }

    /// Append to the organization's activity log
    pub async fn record_activity(&self, activity: NewActivity) {
        let action = activity.action.clone();
        if let Err(e) = self.store.record_activity(activity).await {
            warn!(action = %action, error = %e, "Failed to record activity");
        }
    }

    pub async fn registered(&self, event: &Event, user_id: Uuid) {
        self.notify(
            user_id,
            "Registration confirmed",
            &format!("You are registered for {}.", event.title),
        )
        .await;
    }

    pub async fn payment_pending(&self, event: &Event, user_id: Uuid) {
        self.notify(
            user_id,
            "Payment pending",
            &format!("Complete your payment to confirm your seat at {}.", event.title),
        )
        .await;
    }

    pub async fn unregistered(&self, event: &Event, user_id: Uuid) {
        self.notify(
            user_id,
            "Registration cancelled",
            &format!("You are no longer registered for {}.", event.title),
        )
        .await;
    }

    pub async fn payment_failed(&self, event: &Event, user_id: Uuid) {
        self.notify(
            user_id,
            "Payment not completed",
            &format!("Your payment for {} was not completed and your seat was released.", event.title),
        )
        .await;
    }
}
