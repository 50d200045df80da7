//! Sharing rules on top of the grant table.
//!
//! Anyone may list their own grants on a path; listing someone else's, or
//! changing any, takes `modify`. The drop owner's grants are never revoked
//! through here.

use std::sync::Arc;

use puddle_auth::AccessChecker;
use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::types::{GrantFilter, GrantKind, PermissionKind, UserId, path};
use puddle_entity::permission::PermissionGrant;

use crate::context::RequestContext;
use crate::namespace::NamespaceCoordinator;

#[derive(Debug, Clone)]
pub struct SharingService {
    namespace: Arc<NamespaceCoordinator>,
    access: AccessChecker,
}

impl SharingService {
    pub fn new(namespace: Arc<NamespaceCoordinator>, access: AccessChecker) -> Self {
        Self { namespace, access }
    }

    /// Grants on exactly `target`. `user_id` of `None` lists every grantee;
    /// `GrantKind::All` lists every kind.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        target: &str,
        user_id: Option<UserId>,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>> {
        path::validate(target)?;
        if user_id.as_ref() != Some(&ctx.user_id) {
            self.access
                .require(target, &ctx.user_id, PermissionKind::Modify)
                .await?;
        }
        let filter = GrantFilter::on(target).user(user_id).kind(kind.as_filter());
        self.namespace.stores().permissions.list(&filter).await
    }

    /// Grants `kind` to `user_id` on `target` and everything below it.
    /// Returns the rows created.
    pub async fn grant(
        &self,
        ctx: &RequestContext,
        target: &str,
        user_id: &UserId,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>> {
        path::validate(target)?;
        self.require_user(user_id).await?;
        self.access
            .require(target, &ctx.user_id, PermissionKind::Modify)
            .await?;
        self.namespace.grant(target, user_id, kind).await
    }

    /// Revokes `kind` from `user_id` on `target` and everything below it.
    /// Returns the rows deleted.
    pub async fn revoke(
        &self,
        ctx: &RequestContext,
        target: &str,
        user_id: &UserId,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>> {
        path::validate(target)?;
        self.require_user(user_id).await?;
        let drop = self
            .namespace
            .stores()
            .entries
            .get(target)
            .await?
            .ok_or_else(|| AppError::not_found(format!("'{target}' does not exist")))?;
        if &drop.owner_id == user_id {
            return Err(AppError::validation(format!(
                "The owner's permissions on '{target}' cannot be revoked"
            )));
        }
        self.access
            .require(target, &ctx.user_id, PermissionKind::Modify)
            .await?;

        let filter = GrantFilter::on(target)
            .user(user_id.clone())
            .kind(kind.as_filter());
        self.namespace.revoke(&filter).await
    }

    /// A user exists while their puddle root does.
    async fn require_user(&self, user_id: &UserId) -> AppResult<()> {
        if self
            .namespace
            .stores()
            .entries
            .exists(&user_id.puddle_root())
            .await?
        {
            Ok(())
        } else {
            Err(AppError::validation(format!("Unknown user '{user_id}'")))
        }
    }
}
