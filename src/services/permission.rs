//! Organization permission checks
//!
//! Permissions are keys attached to organization roles. The store answers
//! `has_permission(user, organization, key)` in a single call.

use uuid::Uuid;

use crate::database::DataStore;
use crate::utils::errors::{Result, SyncUpError};

/// Create and edit events, view and export registrations
pub const MANAGE_EVENTS: &str = "manage_events";
/// Scan QR codes and mark attendance
pub const MANAGE_ATTENDANCE: &str = "manage_attendance";

/// Fail with `PermissionDenied` unless the user holds `permission` in the organization
pub async fn require_permission(
    store: &dyn DataStore,
    user_id: Uuid,
    organization_id: Uuid,
    permission: &str,
) -> Result<()> {
    if store.has_permission(user_id, organization_id, permission).await? {
        return Ok(());
    }

    tracing::warn!(
        user_id = %user_id,
        organization_id = %organization_id,
        permission = permission,
        "Permission denied"
    );
    Err(SyncUpError::PermissionDenied(format!("missing permission {}", permission)))
}
