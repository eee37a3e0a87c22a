//! Access token verification
//!
//! Sign-in is handled by the hosted auth provider. This service only verifies
//! the provider's HS256 access tokens and extracts the caller's user id.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::utils::errors::{Result, SyncUpError};

/// Claims carried by provider access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Verified caller of an API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a bearer token and return the caller
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected access token");
            SyncUpError::Authentication("invalid or expired access token".to_string())
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| SyncUpError::Authentication("token subject is not a user id".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            email: data.claims.email,
        })
    }

    /// Extract the token from an `Authorization: Bearer ...` header value
    pub fn bearer_token(header: Option<&str>) -> Result<&str> {
        header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| SyncUpError::Authentication("missing bearer token".to_string()))
    }
}
