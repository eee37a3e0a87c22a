//! Registration eligibility rules
//!
//! Pure decision over a snapshot read from the store. The caller re-reads the
//! snapshot for every check; nothing here touches the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Event, EventRegistration, MemberAccess};

/// Why a user may not register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    EventFinished,
    RegistrationClosed,
    EventFull,
    NotMember,
    RoleNotAllowed,
    MembershipTierNotAllowed,
    RoleOrTierNotAllowed,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::EventFinished => "event_finished",
            Rejection::RegistrationClosed => "registration_closed",
            Rejection::EventFull => "event_full",
            Rejection::NotMember => "not_member",
            Rejection::RoleNotAllowed => "role_not_allowed",
            Rejection::MembershipTierNotAllowed => "membership_tier_not_allowed",
            Rejection::RoleOrTierNotAllowed => "role_or_tier_not_allowed",
        }
    }

    /// Text shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::EventFinished => "This event has already finished.",
            Rejection::RegistrationClosed => "Registration is closed for this event.",
            Rejection::EventFull => "Event Full",
            Rejection::NotMember => "This event is only open to members of the organization.",
            Rejection::RoleNotAllowed => "Your role in the organization is not allowed to join this event.",
            Rejection::MembershipTierNotAllowed => "Your membership tier is not allowed to join this event.",
            Rejection::RoleOrTierNotAllowed => "Neither your role nor your membership tier is allowed to join this event.",
        }
    }

    /// Rejections caused by the event's privacy descriptor
    pub fn is_access_denial(&self) -> bool {
        matches!(
            self,
            Rejection::NotMember
                | Rejection::RoleNotAllowed
                | Rejection::MembershipTierNotAllowed
                | Rejection::RoleOrTierNotAllowed
        )
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Everything the rules need, read fresh from the store
#[derive(Debug, Clone)]
pub struct EligibilitySnapshot<'a> {
    pub event: &'a Event,
    pub registration: Option<&'a EventRegistration>,
    /// Registered plus pending rows
    pub attendee_count: i64,
    /// `None` when the user is not a member of the event's organization
    pub membership: Option<&'a MemberAccess>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    Eligible,
    AlreadyRegistered,
    Rejected(Rejection),
}

/// Decide whether the user may register
pub fn check(snapshot: &EligibilitySnapshot<'_>) -> Eligibility {
    let event = snapshot.event;

    if snapshot.registration.is_some() {
        return Eligibility::AlreadyRegistered;
    }

    if event.is_finished(snapshot.now) {
        return Eligibility::Rejected(Rejection::EventFinished);
    }

    if event.registration_closed(snapshot.now) {
        return Eligibility::Rejected(Rejection::RegistrationClosed);
    }

    if let Some(capacity) = event.capacity {
        if snapshot.attendee_count >= capacity as i64 {
            return Eligibility::Rejected(Rejection::EventFull);
        }
    }

    if event.is_private() {
        if let Err(rejection) = check_privacy(event, snapshot.membership) {
            return Eligibility::Rejected(rejection);
        }
    }

    Eligibility::Eligible
}

/// Membership and role/tier gate of a private event
pub fn check_privacy(event: &Event, membership: Option<&MemberAccess>) -> Result<(), Rejection> {
    let Some(member) = membership else {
        return Err(Rejection::NotMember);
    };

    let privacy = &event.privacy;
    let roles_restricted = privacy.restricts_roles();
    let tiers_restricted = privacy.restricts_tiers();

    let role_ok = roles_restricted && member.has_any_role(&privacy.roles);
    let tier_ok = tiers_restricted && member.has_any_tier(&privacy.membership_tiers);

    match (roles_restricted, tiers_restricted) {
        (false, false) => Ok(()),
        (true, false) if role_ok => Ok(()),
        (true, false) => Err(Rejection::RoleNotAllowed),
        (false, true) if tier_ok => Ok(()),
        (false, true) => Err(Rejection::MembershipTierNotAllowed),
        (true, true) if role_ok || tier_ok => Ok(()),
        (true, true) => Err(Rejection::RoleOrTierNotAllowed),
    }
}
