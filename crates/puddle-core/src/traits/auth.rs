//! Token resolution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::UserId;

/// The identity a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user.
    pub user_id: UserId,
}

/// Resolves an opaque bearer token into an [`Identity`].
///
/// Fails with `InvalidToken` or `ExpiredToken`.
#[async_trait]
pub trait Authenticator: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve `token`.
    async fn resolve(&self, token: &str) -> AppResult<Identity>;
}
