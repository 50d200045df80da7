//! Watch management and watcher notices.

use std::sync::Arc;

use tracing::{debug, info};

use puddle_auth::AccessChecker;
use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::types::{PermissionKind, path};
use puddle_entity::watch::Watch;

use crate::context::RequestContext;
use crate::namespace::NamespaceCoordinator;

#[derive(Debug, Clone)]
pub struct WatchService {
    namespace: Arc<NamespaceCoordinator>,
    access: AccessChecker,
}

impl WatchService {
    pub fn new(namespace: Arc<NamespaceCoordinator>, access: AccessChecker) -> Self {
        Self { namespace, access }
    }

    /// The caller's watches, ordered by path.
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Watch>> {
        self.namespace.stores().watches.list(&ctx.user_id).await
    }

    /// Starts watching `target`. The drop must exist and the caller needs
    /// `read` on it. Returns `false` if the watch was already there.
    pub async fn watch(&self, ctx: &RequestContext, target: &str) -> AppResult<bool> {
        path::validate(target)?;
        let _guard = self.namespace.lock_roots(&[target]).await;

        if !self.namespace.stores().entries.exists(target).await? {
            return Err(AppError::not_found(format!("'{target}' does not exist")));
        }
        self.access
            .require(target, &ctx.user_id, PermissionKind::Read)
            .await?;

        let added = self
            .namespace
            .stores()
            .watches
            .add(&ctx.user_id, target)
            .await?;
        if added {
            self.namespace.events().watch_added(&ctx.user_id, target);
            info!(user_id = %ctx.user_id, path = %target, "Watch added");
        }
        Ok(added)
    }

    /// Stops watching `target`. Returns `false` if there was no watch.
    pub async fn unwatch(&self, ctx: &RequestContext, target: &str) -> AppResult<bool> {
        let _guard = self.namespace.lock_roots(&[target]).await;
        let removed = self
            .namespace
            .stores()
            .watches
            .remove(&ctx.user_id, target)
            .await?;
        if removed {
            self.namespace.events().watch_removed(&ctx.user_id, target);
            info!(user_id = %ctx.user_id, path = %target, "Watch removed");
        }
        Ok(removed)
    }

    /// Sends `message` to every user watching `target`. Returns how many
    /// users were notified.
    pub async fn notify(&self, target: &str, message: &str) -> AppResult<usize> {
        let watchers = self.namespace.stores().watches.list_watchers(target).await?;
        for watch in &watchers {
            self.namespace.events().notify_user(&watch.user_id, message);
        }
        debug!(path = %target, watchers = watchers.len(), "Watchers notified");
        Ok(watchers.len())
    }
}
