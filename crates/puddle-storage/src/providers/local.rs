//! Local filesystem blob store.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;
use puddle_core::traits::BlobStore;
use puddle_core::types::path;

/// Stores each drop under a root directory, mirroring the drop path.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create the provider, creating `root_path` if needed.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Map a drop path onto the filesystem. Rejects anything that could
    /// escape the root.
    fn resolve(&self, drop_path: &str) -> AppResult<PathBuf> {
        path::validate(drop_path)?;
        Ok(self.root.join(drop_path.trim_end_matches(path::SEPARATOR)))
    }

    async fn ensure_parent(&self, target: &Path) -> AppResult<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create parent of", &parent.display().to_string(), e))?;
        }
        Ok(())
    }
}

fn io_error(action: &str, subject: &str, err: std::io::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Storage,
        format!("Failed to {action} {subject}"),
        err,
    )
}

/// Copy a directory tree without recursion.
async fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst).await?;
        let mut dir = fs::read_dir(&src).await?;
        while let Some(entry) = dir.next_entry().await? {
            let target = dst.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), target).await?;
            }
        }
    }
    Ok(())
}

async fn tree_size(root: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir_path) = pending.pop() {
        let mut dir = fs::read_dir(&dir_path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                pending.push(entry.path());
            } else {
                total += meta.len();
            }
        }
    }
    Ok(total)
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    async fn write(&self, drop_path: &str, data: Bytes) -> AppResult<()> {
        let target = self.resolve(drop_path)?;
        self.ensure_parent(&target).await?;
        fs::write(&target, &data)
            .await
            .map_err(|e| io_error("write", drop_path, e))?;
        debug!(path = %drop_path, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn size(&self, drop_path: &str) -> AppResult<u64> {
        let target = self.resolve(drop_path)?;
        let meta = match fs::metadata(&target).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_error("stat", drop_path, e)),
        };
        if meta.is_dir() {
            tree_size(&target)
                .await
                .map_err(|e| io_error("measure", drop_path, e))
        } else {
            Ok(meta.len())
        }
    }

    async fn create_directory(&self, drop_path: &str) -> AppResult<()> {
        let target = self.resolve(drop_path)?;
        fs::create_dir_all(&target)
            .await
            .map_err(|e| io_error("create directory", drop_path, e))
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        self.ensure_parent(&target).await?;

        let meta = fs::metadata(&source)
            .await
            .map_err(|e| io_error("stat", from, e))?;
        let copied = if meta.is_dir() {
            copy_tree(&source, &target).await
        } else {
            fs::copy(&source, &target).await.map(|_| ())
        };
        copied.map_err(|e| io_error("copy", &format!("{from} -> {to}"), e))?;

        debug!(from = %from, to = %to, "Copied blob");
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        self.ensure_parent(&target).await?;
        fs::rename(&source, &target)
            .await
            .map_err(|e| io_error("move", &format!("{from} -> {to}"), e))?;
        debug!(from = %from, to = %to, "Moved blob");
        Ok(())
    }

    async fn delete(&self, drop_path: &str) -> AppResult<()> {
        let target = self.resolve(drop_path)?;
        let result = match fs::metadata(&target).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&target).await,
            Ok(_) => fs::remove_file(&target).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete", drop_path, e)),
        }
    }

    async fn exists(&self, drop_path: &str) -> AppResult<bool> {
        let target = self.resolve(drop_path)?;
        fs::try_exists(&target)
            .await
            .map_err(|e| io_error("stat", drop_path, e))
    }
}
