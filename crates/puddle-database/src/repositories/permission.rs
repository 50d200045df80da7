//! Permission grant repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;
use puddle_core::types::{GrantFilter, GrantKind, PermissionKind, UserId, path};
use puddle_entity::permission::PermissionGrant;

use super::Scope;
use crate::store::PermissionStore;

const COLUMNS: &str = "path, user_id, kind";

/// PostgreSQL [`PermissionStore`].
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PermissionRepository {
    async fn check(
        &self,
        path: &str,
        user_id: &UserId,
        kind: PermissionKind,
    ) -> AppResult<Option<PermissionGrant>> {
        sqlx::query_as::<_, PermissionGrant>(&format!(
            "SELECT {COLUMNS} FROM permission_grants WHERE path = $1 AND user_id = $2 AND kind = $3"
        ))
        .bind(path)
        .bind(user_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check permission", e))
    }

    async fn list(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>> {
        sqlx::query_as::<_, PermissionGrant>(&format!(
            "SELECT {COLUMNS} FROM permission_grants WHERE path = $1 \
             AND ($2::text IS NULL OR user_id = $2) \
             AND ($3::permission_kind IS NULL OR kind = $3) \
             ORDER BY user_id ASC, kind ASC"
        ))
        .bind(&filter.path)
        .bind(filter.user_id.as_ref())
        .bind(filter.kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list permissions", e))
    }

    async fn list_subtree(&self, target: &str) -> AppResult<Vec<PermissionGrant>> {
        let scope = Scope::of(target);
        sqlx::query_as::<_, PermissionGrant>(&format!(
            "SELECT {COLUMNS} FROM permission_grants WHERE {} ORDER BY path, user_id, kind",
            scope.clause
        ))
        .bind(&scope.value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list permissions", e))
    }

    async fn grant(
        &self,
        target: &str,
        user_id: &UserId,
        kind: GrantKind,
    ) -> AppResult<Vec<PermissionGrant>> {
        let scope = Scope::of(target);
        let statement = format!(
            "INSERT INTO permission_grants ({COLUMNS}) \
             SELECT path, $2::text, $3::permission_kind FROM drops WHERE {} \
             ON CONFLICT DO NOTHING RETURNING {COLUMNS}",
            scope.clause
        );

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut created = Vec::new();
        for stored in kind.expand() {
            let rows = sqlx::query_as::<_, PermissionGrant>(&statement)
                .bind(&scope.value)
                .bind(user_id)
                .bind(*stored)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to grant permission", e)
                })?;
            created.extend(rows);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit grant", e)
        })?;

        debug!(
            path = %target,
            user_id = %user_id,
            kind = %kind,
            created = created.len(),
            "Materialised grant"
        );
        Ok(created)
    }

    async fn revoke(&self, filter: &GrantFilter) -> AppResult<Vec<PermissionGrant>> {
        let scope = Scope::of(&filter.path);
        sqlx::query_as::<_, PermissionGrant>(&format!(
            "DELETE FROM permission_grants WHERE {} \
             AND ($2::text IS NULL OR user_id = $2) \
             AND ($3::permission_kind IS NULL OR kind = $3) \
             RETURNING {COLUMNS}",
            scope.clause
        ))
        .bind(&scope.value)
        .bind(filter.user_id.as_ref())
        .bind(filter.kind)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke permissions", e))
    }

    async fn revoke_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<PermissionGrant>> {
        sqlx::query_as::<_, PermissionGrant>(&format!(
            "DELETE FROM permission_grants WHERE user_id = $1 RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user permissions", e)
        })
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64> {
        let from = Scope::of(old_path);
        let to = Scope::of(new_path);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Nothing lives at the destination yet, so any grant there is stale.
        if !path::is_within(new_path, old_path) {
            sqlx::query(&format!("DELETE FROM permission_grants WHERE {}", to.clause))
                .bind(&to.value)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to clear destination", e)
                })?;
        }

        let result = sqlx::query(&format!(
            "UPDATE permission_grants SET path = $2 || substr(path, char_length($3) + 1) WHERE {}",
            from.clause
        ))
        .bind(&from.value)
        .bind(new_path)
        .bind(old_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename permissions", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rename", e)
        })?;
        Ok(result.rows_affected())
    }
}
