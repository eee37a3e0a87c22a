//! Test data helpers for creating test objects
//!
//! Builders for events, users and memberships, plus signed access tokens.

use chrono::{DateTime, Duration, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use syncup::models::{Event, EventPrivacy, MemberAccess, PrivacyType, UserProfile};
use syncup::services::auth::Claims;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_AUDIENCE: &str = "authenticated";
pub const TEST_CALLBACK_TOKEN: &str = "test-callback-token";
pub const TEST_SITE_URL: &str = "https://syncup.test";

/// Builder for test events; defaults to a free public event starting tomorrow
pub struct TestEvent {
    event: Event,
}

impl TestEvent {
    pub fn new(organization_id: Uuid) -> Self {
        let now = Utc::now();
        let starts_at = now + Duration::days(1);
        let title: String = Sentence(2..5).fake();

        Self {
            event: Event {
                id: Uuid::new_v4(),
                organization_id,
                title: title.trim_end_matches('.').to_string(),
                description: None,
                starts_at,
                ends_at: starts_at + Duration::hours(2),
                location: Some("Main Hall".to_string()),
                capacity: None,
                registration_fee: 0,
                onsite: false,
                privacy: EventPrivacy::public(),
                photo_path: None,
                created_by: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.event.title = title.to_string();
        self
    }

    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.event.capacity = Some(capacity);
        self
    }

    pub fn with_fee(mut self, fee: i64) -> Self {
        self.event.registration_fee = fee;
        self
    }

    pub fn with_onsite(mut self, onsite: bool) -> Self {
        self.event.onsite = onsite;
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.event.location = Some(location.to_string());
        self
    }

    pub fn with_times(mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        self.event.starts_at = starts_at;
        self.event.ends_at = ends_at;
        self
    }

    /// Event already under way
    pub fn started(self) -> Self {
        let now = Utc::now();
        self.with_times(now - Duration::minutes(30), now + Duration::hours(1))
    }

    /// Event that ended an hour ago
    pub fn finished(self) -> Self {
        let now = Utc::now();
        self.with_times(now - Duration::hours(3), now - Duration::hours(1))
    }

    pub fn with_privacy(mut self, privacy: EventPrivacy) -> Self {
        self.event.privacy = privacy;
        self
    }

    pub fn members_only(self) -> Self {
        self.with_privacy(EventPrivacy::members_only())
    }

    pub fn build(self) -> Event {
        self.event
    }
}

/// Private event limited to the given roles
pub fn roles_only(roles: &[&str]) -> EventPrivacy {
    EventPrivacy {
        kind: PrivacyType::Private,
        roles: roles.iter().map(|r| r.to_string()).collect(),
        membership_tiers: Vec::new(),
        allow_all_roles: false,
        allow_all_memberships: true,
    }
}

/// Private event limited to the given membership tiers
pub fn tiers_only(tiers: &[&str]) -> EventPrivacy {
    EventPrivacy {
        kind: PrivacyType::Private,
        roles: Vec::new(),
        membership_tiers: tiers.iter().map(|t| t.to_string()).collect(),
        allow_all_roles: true,
        allow_all_memberships: false,
    }
}

pub fn create_test_user() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: SafeEmail().fake(),
        first_name: Some(FirstName().fake()),
        last_name: Some(LastName().fake()),
    }
}

pub fn create_test_member(organization_id: Uuid, user_id: Uuid, roles: &[&str], tier: Option<&str>) -> MemberAccess {
    MemberAccess {
        member_id: Uuid::new_v4(),
        organization_id,
        user_id,
        membership_tier: tier.map(str::to_string),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Signed access token for `user_id`, valid for an hour
pub fn access_token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        aud: Some(TEST_AUDIENCE.to_string()),
        email: None,
        role: Some("authenticated".to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}
