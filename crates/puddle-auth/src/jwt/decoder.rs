//! Access token validation.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use puddle_core::config::AuthConfig;
use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;
use puddle_core::traits::{Authenticator, Identity};
use puddle_core::types::UserId;

use super::claims::Claims;

/// [`Authenticator`] over HS256 access tokens.
#[derive(Clone)]
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl JwtAuthenticator {
    /// Create an authenticator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate a token.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => {
                    AppError::with_source(ErrorKind::ExpiredToken, "Token has expired", e)
                }
                JwtErrorKind::InvalidSignature => {
                    AppError::with_source(ErrorKind::InvalidToken, "Invalid token signature", e)
                }
                _ => AppError::with_source(
                    ErrorKind::InvalidToken,
                    format!("Token validation failed: {e}"),
                    e,
                ),
            })
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn resolve(&self, token: &str) -> AppResult<Identity> {
        let claims = self.decode(token)?;
        let user_id = UserId::parse(claims.sub.0)
            .map_err(|_| AppError::invalid_token("Token subject is not a valid user id"))?;
        debug!(user_id = %user_id, "Resolved access token");
        Ok(Identity { user_id })
    }
}
