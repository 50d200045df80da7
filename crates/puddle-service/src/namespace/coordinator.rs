//! Compound namespace operations.
//!
//! Every structural mutation runs here: entries first, then the grants and
//! watches that hang off the same paths, then events, then the physical
//! bytes. Callers are expected to have checked permissions already.
//!
//! Each cascade step is prefix-scoped and idempotent, so an interrupted
//! operation can be finished by running the same step again against the
//! current entry set (see [`NamespaceCoordinator::repair`]).

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::traits::{BlobStore, EventPublisher};
use puddle_core::types::{GrantFilter, GrantKind, UserId, path};
use puddle_database::Stores;
use puddle_entity::drop::{Drop, NewDrop};
use puddle_entity::permission::PermissionGrant;
use puddle_entity::watch::Watch;

use super::locks::{NamespaceGuard, NamespaceLocks};

/// What [`NamespaceCoordinator::repair`] cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Grants whose path had no entry.
    pub grants_removed: u64,
    /// Watches whose path had no entry.
    pub watches_removed: u64,
}

/// Single owner of multi-store consistency.
#[derive(Debug, Clone)]
pub struct NamespaceCoordinator {
    stores: Stores,
    blobs: Arc<dyn BlobStore>,
    events: Arc<dyn EventPublisher>,
    locks: Arc<NamespaceLocks>,
}

impl NamespaceCoordinator {
    pub fn new(stores: Stores, blobs: Arc<dyn BlobStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            stores,
            blobs,
            events,
            locks: Arc::new(NamespaceLocks::new()),
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn events(&self) -> &Arc<dyn EventPublisher> {
        &self.events
    }

    /// Locks the puddles containing `paths` for a mutation made outside this
    /// type.
    pub async fn lock_roots(&self, paths: &[&str]) -> NamespaceGuard {
        self.locks.lock(paths).await
    }

    /// Creates the entry at `target`, then copies every grant found on
    /// `acl_source` onto it.
    ///
    /// The parent directory must exist unless `target` is a puddle root.
    pub async fn create_entry(
        &self,
        target: &str,
        creator: &UserId,
        owner: &UserId,
        acl_source: Option<&str>,
    ) -> AppResult<Drop> {
        check_placement(target)?;
        let _guard = self.locks.lock(&[target]).await;
        self.insert_entry(target, creator, owner).await?;
        self.finish_create(target, creator, owner, acl_source).await
    }

    /// Creates the file entry at `target` and stores `data` as its bytes,
    /// all under one lock.
    ///
    /// The entry is committed before the bytes land, so a concurrent
    /// creator of the same path fails with `AlreadyExists` without touching
    /// storage. A failed write removes the entry again.
    pub async fn create_file(
        &self,
        target: &str,
        creator: &UserId,
        owner: &UserId,
        acl_source: Option<&str>,
        data: Bytes,
    ) -> AppResult<Drop> {
        check_placement(target)?;
        if path::is_directory(target) {
            return Err(AppError::invalid_path(format!("'{target}' is not a file path")));
        }
        let _guard = self.locks.lock(&[target]).await;
        self.insert_entry(target, creator, owner).await?;

        if let Err(e) = self.blobs.write(target, data).await {
            warn!(path = %target, error = %e, "Blob write failed, removing entry");
            if let Err(rollback) = self.stores.entries.delete(target).await {
                warn!(path = %target, error = %rollback, "Could not remove entry after failed write");
            }
            return Err(e);
        }

        self.finish_create(target, creator, owner, acl_source).await
    }

    /// Inserts the entry row. Caller holds the lock.
    async fn insert_entry(&self, target: &str, creator: &UserId, owner: &UserId) -> AppResult<()> {
        let parent = path::parent_dir(target);
        if !parent.is_empty() && !self.stores.entries.exists(parent).await? {
            return Err(AppError::not_found(format!(
                "Parent directory '{parent}' does not exist"
            )));
        }
        self.ensure_no_twin(target).await?;

        let created = self
            .stores
            .entries
            .create(NewDrop::new(target, creator.clone(), owner.clone()))
            .await?;
        if !created {
            return Err(AppError::already_exists(format!("'{target}' already exists")));
        }
        Ok(())
    }

    /// ACL inheritance, directory bytes and events for a fresh entry.
    async fn finish_create(
        &self,
        target: &str,
        creator: &UserId,
        owner: &UserId,
        acl_source: Option<&str>,
    ) -> AppResult<Drop> {
        if let Some(source) = acl_source {
            self.copy_acl(source, target).await?;
        }

        if path::is_directory(target) {
            self.blobs.create_directory(target).await?;
        }
        let parent = path::parent_dir(target);
        if !parent.is_empty() {
            self.events.publish_modified(parent);
        }

        info!(path = %target, creator = %creator, owner = %owner, "Drop created");
        self.stores
            .entries
            .get(target)
            .await?
            .ok_or_else(|| AppError::internal(format!("'{target}' vanished after creation")))
    }

    /// Refuses `target` when the same name exists with the other kind.
    async fn ensure_no_twin(&self, target: &str) -> AppResult<()> {
        let twin = path::twin(target);
        if self.stores.entries.exists(&twin).await? {
            return Err(AppError::already_exists(format!(
                "'{twin}' already exists under the same name"
            )));
        }
        Ok(())
    }

    /// Moves `old_path` (with its whole subtree for directories) to
    /// `new_path`.
    ///
    /// The moved entries take the owner of the destination directory, and
    /// that owner is granted every permission kind on the moved drops.
    /// Returns the number of entries moved.
    pub async fn rename_entry(
        &self,
        old_path: &str,
        new_path: &str,
        editor: &UserId,
    ) -> AppResult<u64> {
        path::validate(old_path)?;
        path::validate(new_path)?;
        if !path::same_kind(old_path, new_path) {
            return Err(AppError::invalid_path(
                "A directory can only become a directory and a file a file",
            ));
        }
        if path::is_protected_root(old_path) || path::is_protected_root(new_path) {
            return Err(AppError::invalid_path("Puddle roots cannot be moved"));
        }
        if path::is_within(new_path, old_path) {
            return Err(AppError::invalid_path(format!(
                "Cannot move '{old_path}' into itself"
            )));
        }

        let _guard = self.locks.lock(&[old_path, new_path]).await;

        if !self.stores.entries.exists(old_path).await? {
            return Err(AppError::not_found(format!("'{old_path}' does not exist")));
        }
        if self.stores.entries.exists(new_path).await? {
            return Err(AppError::already_exists(format!("'{new_path}' already exists")));
        }
        self.ensure_no_twin(new_path).await?;
        let new_parent = path::parent_dir(new_path);
        let new_owner = self
            .stores
            .entries
            .get(new_parent)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Destination directory '{new_parent}' does not exist"))
            })?
            .owner_id;

        let moved_paths = self.subtree_paths(old_path).await?;

        let moved = self
            .stores
            .entries
            .rename(old_path, new_path, editor, &new_owner)
            .await?;
        self.stores.permissions.rename(old_path, new_path).await?;
        self.stores.watches.rename(old_path, new_path).await?;
        let granted = self
            .stores
            .permissions
            .grant(new_path, &new_owner, GrantKind::All)
            .await?;

        let old_parent = path::parent_dir(old_path);
        self.events.publish_modified(old_parent);
        if new_parent != old_parent {
            self.events.publish_modified(new_parent);
        }
        for moved_path in &moved_paths {
            if let Some(rebased) = path::rebase(moved_path, old_path, new_path) {
                self.events.publish_redefined(moved_path, &rebased);
            }
        }
        self.events.paths_rebased(old_path, new_path);
        self.publish_grants(&granted, true);

        self.blobs.rename(old_path, new_path).await?;

        info!(
            old_path = %old_path,
            new_path = %new_path,
            editor = %editor,
            owner = %new_owner,
            moved,
            "Drop moved"
        );
        Ok(moved)
    }

    /// Deletes `target` with its subtree. Puddle roots are refused; they go
    /// away with their account through [`Self::remove_puddle`].
    ///
    /// Returns the number of entries removed.
    pub async fn delete_entry(&self, target: &str) -> AppResult<u64> {
        path::validate(target)?;
        if path::is_protected_root(target) {
            return Err(AppError::invalid_path(format!(
                "Puddle root '{target}' can only be removed with its account"
            )));
        }
        let _guard = self.locks.lock(&[target]).await;
        self.remove_tree(target).await
    }

    /// Deletes a whole puddle. Used by account deletion only.
    pub async fn remove_puddle(&self, root: &str) -> AppResult<u64> {
        if !path::is_directory(root) || !path::is_protected_root(root) {
            return Err(AppError::invalid_path(format!("'{root}' is not a puddle root")));
        }
        let guard = self.locks.lock(&[root]).await;
        let removed = self.remove_tree(root).await;
        drop(guard);
        self.locks.release(root);
        removed
    }

    /// Revoke grants, drop watches, delete entries, then notify and remove
    /// bytes. Caller holds the lock.
    async fn remove_tree(&self, target: &str) -> AppResult<u64> {
        let removed_paths = self.subtree_paths(target).await?;

        let revoked = self
            .stores
            .permissions
            .revoke(&GrantFilter::on(target))
            .await?;
        let unwatched = self.stores.watches.remove_all_for_path(target).await?;

        let deleted = self.stores.entries.delete(target).await?;
        if deleted == 0 {
            self.publish_grants(&revoked, false);
            self.publish_unwatched(&unwatched);
            return Err(AppError::deletion_failed(format!(
                "Nothing to delete at '{target}'"
            )));
        }

        for removed in &removed_paths {
            self.events.publish_deleted(removed);
        }
        let parent = path::parent_dir(target);
        if !parent.is_empty() {
            self.events.publish_modified(parent);
        }
        self.publish_grants(&revoked, false);
        self.publish_unwatched(&unwatched);

        self.blobs.delete(target).await?;

        info!(
            path = %target,
            entries = deleted,
            grants = revoked.len(),
            watches = unwatched.len(),
            "Drop deleted"
        );
        Ok(deleted)
    }

    /// Copies `source` (with its subtree for directories) to `destination`.
    ///
    /// Every copied entry is created by `requester` and owned by
    /// `destination_owner`. The grants of the destination's parent are then
    /// materialised over the whole copy. Returns the number of entries
    /// created.
    pub async fn copy_entry(
        &self,
        source: &str,
        destination: &str,
        requester: &UserId,
        destination_owner: &UserId,
    ) -> AppResult<u64> {
        path::validate(source)?;
        path::validate(destination)?;
        if !path::same_kind(source, destination) {
            return Err(AppError::invalid_path(
                "A directory can only be copied to a directory and a file to a file",
            ));
        }
        if path::is_protected_root(destination) {
            return Err(AppError::invalid_path("A puddle root cannot be a copy destination"));
        }
        if path::is_within(destination, source) {
            return Err(AppError::invalid_path(format!(
                "Cannot copy '{source}' into itself"
            )));
        }

        let _guard = self.locks.lock(&[source, destination]).await;

        let sources = self.subtree(source).await?;
        if sources.is_empty() {
            return Err(AppError::not_found(format!("'{source}' does not exist")));
        }
        if self.stores.entries.exists(destination).await? {
            return Err(AppError::already_exists(format!(
                "'{destination}' already exists"
            )));
        }
        self.ensure_no_twin(destination).await?;
        let parent = path::parent_dir(destination);
        if !self.stores.entries.exists(parent).await? {
            return Err(AppError::not_found(format!(
                "Destination directory '{parent}' does not exist"
            )));
        }

        let copies: Vec<NewDrop> = sources
            .iter()
            .filter_map(|drop| path::rebase(&drop.path, source, destination))
            .map(|copy| NewDrop::new(copy, requester.clone(), destination_owner.clone()))
            .collect();
        let created = self.stores.entries.create_many(copies).await?;

        self.copy_acl(parent, destination).await?;
        self.events.publish_modified(parent);

        self.blobs.copy(source, destination).await?;

        info!(
            source = %source,
            destination = %destination,
            requester = %requester,
            created,
            "Drop copied"
        );
        Ok(created)
    }

    /// Materialises `kind` for `user_id` on `target` and its subtree.
    /// Returns the rows created.
    pub async fn grant(
        &self,
        target: &str,
        user_id: &UserId,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>> {
        let _guard = self.locks.lock(&[target]).await;
        let created = self.stores.permissions.grant(target, user_id, kind).await?;
        self.publish_grants(&created, true);
        info!(path = %target, user_id = %user_id, kind = %kind, rows = created.len(), "Permission granted");
        Ok(created)
    }

    /// Deletes the grants matching `filter` (subtree-scoped for
    /// directories). Returns the rows deleted.
    pub async fn revoke(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>> {
        let _guard = self.locks.lock(&[filter.path.as_str()]).await;
        let revoked = self.stores.permissions.revoke(filter).await?;
        self.publish_grants(&revoked, false);
        info!(path = %filter.path, rows = revoked.len(), "Permissions revoked");
        Ok(revoked)
    }

    /// Removes every grant and watch `user_id` holds anywhere.
    pub async fn forget_user(&self, user_id: &UserId) -> AppResult<(u64, u64)> {
        let revoked = self.stores.permissions.revoke_all_for_user(user_id).await?;
        self.publish_grants(&revoked, false);
        let unwatched = self.stores.watches.remove_all_for_user(user_id).await?;
        self.publish_unwatched(&unwatched);
        Ok((revoked.len() as u64, unwatched.len() as u64))
    }

    /// Removes grants and watches under `root` whose path has no entry.
    ///
    /// Entries are the source of truth; this finishes a cascade that was
    /// interrupted between steps.
    pub async fn repair(&self, root: &str) -> AppResult<RepairReport> {
        path::validate(root)?;
        let _guard = self.locks.lock(&[root]).await;
        let mut report = RepairReport::default();

        let grant_paths: BTreeSet<String> = self
            .stores
            .permissions
            .list_subtree(root)
            .await?
            .into_iter()
            .map(|grant| grant.path)
            .collect();
        for dangling in grant_paths {
            if self.stores.entries.exists(&dangling).await? {
                continue;
            }
            if path::is_directory(&dangling)
                && !self.stores.entries.list_subtree(&dangling).await?.is_empty()
            {
                warn!(path = %dangling, "Directory entry missing but descendants remain");
                continue;
            }
            let removed = self
                .stores
                .permissions
                .revoke(&GrantFilter::on(dangling))
                .await?;
            report.grants_removed += removed.len() as u64;
        }

        for watch in self.stores.watches.list_subtree(root).await? {
            if self.stores.entries.exists(&watch.path).await? {
                continue;
            }
            if self.stores.watches.remove(&watch.user_id, &watch.path).await? {
                self.events.watch_removed(&watch.user_id, &watch.path);
                report.watches_removed += 1;
            }
        }

        if report != RepairReport::default() {
            warn!(
                root = %root,
                grants = report.grants_removed,
                watches = report.watches_removed,
                "Repaired dangling records"
            );
        }
        Ok(report)
    }

    /// Copies every grant on `source` onto `target`, expanding over
    /// `target`'s subtree.
    async fn copy_acl(&self, source: &str, target: &str) -> AppResult<()> {
        let grants = self.stores.permissions.list(&GrantFilter::on(source)).await?;
        for grant in grants {
            let created = self
                .stores
                .permissions
                .grant(target, &grant.user_id, grant.kind.into())
                .await?;
            self.publish_grants(&created, true);
        }
        Ok(())
    }

    /// The entry at `target` and, for directories, everything below it.
    async fn subtree(&self, target: &str) -> AppResult<Vec<Drop>> {
        if path::is_directory(target) {
            self.stores.entries.list_subtree(target).await
        } else {
            Ok(self.stores.entries.get(target).await?.into_iter().collect())
        }
    }

    async fn subtree_paths(&self, target: &str) -> AppResult<Vec<String>> {
        Ok(self
            .subtree(target)
            .await?
            .into_iter()
            .map(|drop| drop.path)
            .collect())
    }

    fn publish_grants(&self, grants: &[PermissionGrant], granted: bool) {
        for grant in grants {
            self.events
                .publish_permission_changed(&grant.path, &grant.user_id, grant.kind, granted);
        }
    }

    fn publish_unwatched(&self, watches: &[Watch]) {
        for watch in watches {
            self.events.watch_removed(&watch.user_id, &watch.path);
        }
    }
}

/// A file must sit inside a puddle; only directories may be roots.
fn check_placement(target: &str) -> AppResult<()> {
    path::validate(target)?;
    if path::parent_dir(target).is_empty() && !path::is_directory(target) {
        return Err(AppError::invalid_path(format!(
            "'{target}' must live inside a puddle"
        )));
    }
    Ok(())
}
