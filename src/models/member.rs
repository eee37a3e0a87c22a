//! Organization member model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's standing in an organization: role names and membership tier
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MemberAccess {
    pub member_id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub membership_tier: Option<String>,
    pub roles: Vec<String>,
}

impl MemberAccess {
    /// Case-insensitive role match against an allow list
    pub fn has_any_role(&self, allowed: &[String]) -> bool {
        self.roles
            .iter()
            .any(|role| allowed.iter().any(|a| names_match(a, role)))
    }

    /// Case-insensitive tier match against an allow list
    pub fn has_any_tier(&self, allowed: &[String]) -> bool {
        match self.membership_tier {
            Some(ref tier) => allowed.iter().any(|a| names_match(a, tier)),
            None => false,
        }
    }
}

fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Profile fields of an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}
