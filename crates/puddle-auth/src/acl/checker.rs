//! Permission checks against the materialised grant table.

use std::sync::Arc;

use tracing::debug;

use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::types::{GrantFilter, PermissionKind, UserId};
use puddle_database::PermissionStore;

/// Answers authorization questions with point lookups. Grants are copied
/// onto every drop, so no tree walk is needed.
#[derive(Debug, Clone)]
pub struct AccessChecker {
    permissions: Arc<dyn PermissionStore>,
}

impl AccessChecker {
    /// Create a checker over `permissions`.
    pub fn new(permissions: Arc<dyn PermissionStore>) -> Self {
        Self { permissions }
    }

    /// Whether `user_id` holds `kind` on `path`.
    pub async fn has(&self, path: &str, user_id: &UserId, kind: PermissionKind) -> AppResult<bool> {
        Ok(self.permissions.check(path, user_id, kind).await?.is_some())
    }

    /// Fail with `InsufficientPermission` unless `user_id` holds `kind` on
    /// `path`.
    pub async fn require(&self, path: &str, user_id: &UserId, kind: PermissionKind) -> AppResult<()> {
        if self.has(path, user_id, kind).await? {
            return Ok(());
        }
        debug!(path = %path, user_id = %user_id, kind = %kind, "Permission denied");
        Err(AppError::insufficient_permission(format!(
            "{user_id} lacks {kind} permission on '{path}'"
        )))
    }

    /// Every kind `user_id` holds on `path`.
    pub async fn kinds_on(&self, path: &str, user_id: &UserId) -> AppResult<Vec<PermissionKind>> {
        let grants = self
            .permissions
            .list(&GrantFilter::on(path).user(user_id.clone()))
            .await?;
        Ok(grants.into_iter().map(|g| g.kind).collect())
    }
}
