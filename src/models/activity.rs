//! Activity log model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ACTION_REGISTERED: &str = "event_registered";
pub const ACTION_UNREGISTERED: &str = "event_unregistered";
pub const ACTION_PAYMENT_STARTED: &str = "event_payment_started";
pub const ACTION_ATTENDANCE_MARKED: &str = "attendance_marked";
pub const ACTION_EVENT_CREATED: &str = "event_created";
pub const ACTION_EVENT_UPDATED: &str = "event_updated";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewActivity {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub details: serde_json::Value,
}

impl NewActivity {
    pub fn new(organization_id: Uuid, user_id: Uuid, action: &str, details: serde_json::Value) -> Self {
        Self {
            organization_id,
            user_id,
            action: action.to_string(),
            details,
        }
    }
}
