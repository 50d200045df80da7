//! Drop operations with permission enforcement.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use puddle_auth::AccessChecker;
use puddle_core::error::AppError;
use puddle_core::result::AppResult;
use puddle_core::types::{PermissionKind, path};
use puddle_entity::drop::Drop;

use crate::context::RequestContext;
use crate::namespace::NamespaceCoordinator;

/// A drop with its size and the caller's permissions on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropInfo {
    #[serde(flatten)]
    pub drop: Drop,
    /// Bytes stored at the path (summed for directories).
    pub size: u64,
    /// Kinds the caller holds on the path.
    pub permissions: Vec<PermissionKind>,
}

/// Browses and restructures drops on behalf of a caller.
#[derive(Debug, Clone)]
pub struct DropService {
    namespace: Arc<NamespaceCoordinator>,
    access: AccessChecker,
}

impl DropService {
    pub fn new(namespace: Arc<NamespaceCoordinator>, access: AccessChecker) -> Self {
        Self { namespace, access }
    }

    async fn existing(&self, target: &str) -> AppResult<Drop> {
        path::validate(target)?;
        self.namespace
            .stores()
            .entries
            .get(target)
            .await?
            .ok_or_else(|| AppError::not_found(format!("'{target}' does not exist")))
    }

    async fn existing_directory(&self, target: &str) -> AppResult<Drop> {
        if !path::is_directory(target) {
            return Err(AppError::invalid_path(format!("'{target}' is not a directory")));
        }
        self.existing(target).await
    }

    /// Metadata for `target`. Requires `read`.
    pub async fn info(&self, ctx: &RequestContext, target: &str) -> AppResult<DropInfo> {
        let drop = self.existing(target).await?;
        self.access
            .require(target, &ctx.user_id, PermissionKind::Read)
            .await?;
        let size = self.namespace.blobs().size(target).await?;
        let permissions = self.access.kinds_on(target, &ctx.user_id).await?;
        Ok(DropInfo {
            drop,
            size,
            permissions,
        })
    }

    /// Immediate children of directory `dir`. Requires `read`.
    pub async fn contents(&self, ctx: &RequestContext, dir: &str) -> AppResult<Vec<Drop>> {
        self.existing_directory(dir).await?;
        self.access
            .require(dir, &ctx.user_id, PermissionKind::Read)
            .await?;
        self.namespace
            .stores()
            .entries
            .list_immediate_children(dir)
            .await
    }

    /// Creates directory `name` inside `parent`. Requires `write` on
    /// `parent`. The new directory belongs to the parent's owner and starts
    /// with the parent's grants.
    pub async fn create_directory(
        &self,
        ctx: &RequestContext,
        parent: &str,
        name: &str,
    ) -> AppResult<Drop> {
        let parent_drop = self.existing_directory(parent).await?;
        self.access
            .require(parent, &ctx.user_id, PermissionKind::Write)
            .await?;

        let name = name.trim().trim_end_matches(path::SEPARATOR);
        if name.is_empty() {
            return Err(AppError::validation("Directory name cannot be empty"));
        }
        let name = path::sanitize_name(name);
        let target = path::join(parent, &format!("{name}{}", path::SEPARATOR))?;

        self.namespace
            .create_entry(&target, &ctx.user_id, &parent_drop.owner_id, Some(parent))
            .await
    }

    /// Stores `data` as file `name` inside `dir` and registers the entry.
    /// Requires `write` on `dir`.
    pub async fn register_upload(
        &self,
        ctx: &RequestContext,
        dir: &str,
        name: &str,
        data: Bytes,
    ) -> AppResult<Drop> {
        let dir_drop = self.existing_directory(dir).await?;
        self.access
            .require(dir, &ctx.user_id, PermissionKind::Write)
            .await?;

        if name.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        let name = path::sanitize_name(name);
        let target = path::join(dir, &name)?;

        let size = data.len();
        let drop = self
            .namespace
            .create_file(&target, &ctx.user_id, &dir_drop.owner_id, Some(dir), data)
            .await?;
        info!(path = %target, size, "Upload registered");
        Ok(drop)
    }

    /// Moves `source` into directory `new_dir`, optionally under a new name.
    /// Requires `write` on `source` and on `new_dir`.
    pub async fn move_drop(
        &self,
        ctx: &RequestContext,
        source: &str,
        new_dir: &str,
        new_name: Option<&str>,
    ) -> AppResult<String> {
        if !path::is_directory(new_dir) {
            return Err(AppError::invalid_path(format!("'{new_dir}' is not a directory")));
        }
        path::validate(source)?;
        self.access
            .require(source, &ctx.user_id, PermissionKind::Write)
            .await?;
        self.access
            .require(new_dir, &ctx.user_id, PermissionKind::Write)
            .await?;

        let leaf = match new_name {
            Some(name) => {
                let name = name.trim().trim_end_matches(path::SEPARATOR);
                if name.is_empty() {
                    return Err(AppError::validation("Name cannot be empty"));
                }
                let mut name = path::sanitize_name(name);
                if path::is_directory(source) {
                    name.push(path::SEPARATOR);
                }
                name
            }
            None => path::leaf_name(source).to_string(),
        };
        let target = path::join(new_dir, &leaf)?;

        self.namespace
            .rename_entry(source, &target, &ctx.user_id)
            .await?;
        Ok(target)
    }

    /// Copies `source` to `destination`. Requires `read` on `source` and
    /// `write` on the destination's directory. The copy belongs to the
    /// owner of that directory.
    pub async fn copy_drop(
        &self,
        ctx: &RequestContext,
        source: &str,
        destination: &str,
    ) -> AppResult<u64> {
        let destination = sanitize_path(destination);
        path::validate(source)?;
        path::validate(&destination)?;
        if !path::same_kind(source, &destination) {
            return Err(AppError::invalid_path(
                "A directory can only be copied to a directory and a file to a file",
            ));
        }
        let destination_dir = path::parent_dir(&destination);

        self.access
            .require(source, &ctx.user_id, PermissionKind::Read)
            .await?;
        self.access
            .require(destination_dir, &ctx.user_id, PermissionKind::Write)
            .await?;
        let owner = self.existing(destination_dir).await?.owner_id;

        self.namespace
            .copy_entry(source, &destination, &ctx.user_id, &owner)
            .await
    }

    /// Deletes `target` with its subtree. Requires `write`.
    pub async fn delete_drop(&self, ctx: &RequestContext, target: &str) -> AppResult<u64> {
        path::validate(target)?;
        if path::is_protected_root(target) {
            return Err(AppError::invalid_path(
                "A puddle root can only be removed with its account",
            ));
        }
        self.access
            .require(target, &ctx.user_id, PermissionKind::Write)
            .await?;
        self.namespace.delete_entry(target).await
    }
}

/// Sanitises every segment of `raw`, keeping the separators.
fn sanitize_path(raw: &str) -> String {
    raw.split(path::SEPARATOR)
        .map(|segment| {
            if segment.is_empty() {
                String::new()
            } else {
                path::sanitize_name(segment)
            }
        })
        .collect::<Vec<_>>()
        .join(&path::SEPARATOR.to_string())
}
