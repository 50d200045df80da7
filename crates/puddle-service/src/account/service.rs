//! Creating and removing a user's puddle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::types::{GrantFilter, GrantKind, UserId};
use puddle_entity::drop::Drop;

use crate::namespace::NamespaceCoordinator;

/// Counts of what an account deletion removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRemoval {
    pub entries: u64,
    pub grants: u64,
    pub watches: u64,
}

#[derive(Debug, Clone)]
pub struct AccountService {
    namespace: Arc<NamespaceCoordinator>,
}

impl AccountService {
    pub fn new(namespace: Arc<NamespaceCoordinator>) -> Self {
        Self { namespace }
    }

    /// Whether `user_id` has a puddle.
    pub async fn exists(&self, user_id: &UserId) -> AppResult<bool> {
        self.namespace
            .stores()
            .entries
            .exists(&user_id.puddle_root())
            .await
    }

    /// Creates the puddle root `<uid>/` and gives the user every permission
    /// kind on it.
    pub async fn create(&self, user_id: &UserId) -> AppResult<Drop> {
        UserId::parse(user_id.as_str())?;
        let root = user_id.puddle_root();
        let drop = self
            .namespace
            .create_entry(&root, user_id, user_id, None)
            .await?;
        self.namespace.grant(&root, user_id, GrantKind::All).await?;
        info!(user_id = %user_id, "Account created");
        Ok(drop)
    }

    /// Removes the user's puddle and every grant and watch they hold.
    pub async fn delete(&self, user_id: &UserId) -> AppResult<AccountRemoval> {
        let root = user_id.puddle_root();
        if !self.exists(user_id).await? {
            return Err(AppError::not_found(format!("Unknown user '{user_id}'")));
        }

        let on_root = self.namespace.revoke(&GrantFilter::on(root.as_str())).await?;
        let entries = self.namespace.remove_puddle(&root).await?;
        let (grants, watches) = self.namespace.forget_user(user_id).await?;

        let removal = AccountRemoval {
            entries,
            grants: grants + on_root.len() as u64,
            watches,
        };
        info!(
            user_id = %user_id,
            entries = removal.entries,
            grants = removal.grants,
            watches = removal.watches,
            "Account deleted"
        );
        Ok(removal)
    }
}
