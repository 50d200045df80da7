//! Access token issuance.

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use puddle_core::config::AuthConfig;
use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;
use puddle_core::types::UserId;

use super::claims::Claims;

/// Signs HS256 access tokens.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer").field("ttl", &self.ttl).finish()
    }
}

impl JwtIssuer {
    /// Create an issuer from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::minutes(config.access_ttl_minutes as i64),
        }
    }

    /// Issue an access token for `user_id`.
    pub fn issue(&self, user_id: &UserId) -> AppResult<String> {
        let now = Utc::now();
        self.issue_with_expiry(user_id, now.timestamp(), (now + self.ttl).timestamp())
    }

    /// Issue a token with explicit timestamps.
    pub fn issue_with_expiry(&self, user_id: &UserId, iat: i64, exp: i64) -> AppResult<String> {
        let claims = Claims {
            sub: user_id.clone(),
            iat,
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to sign access token", e)
        })
    }
}
