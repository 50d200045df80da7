//! Drop repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;
use puddle_core::types::{UserId, path};
use puddle_entity::drop::{Drop, NewDrop};

use super::Scope;
use crate::store::EntryStore;

/// PostgreSQL [`EntryStore`].
#[derive(Debug, Clone)]
pub struct DropRepository {
    pool: PgPool,
}

impl DropRepository {
    /// Create a new drop repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for DropRepository {
    async fn get(&self, path: &str) -> AppResult<Option<Drop>> {
        sqlx::query_as::<_, Drop>("SELECT * FROM drops WHERE path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find drop", e))
    }

    async fn create(&self, drop: NewDrop) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO drops (path, created_by, last_edited_by, owner_id) \
             VALUES ($1, $2, $2, $3) ON CONFLICT (path) DO NOTHING",
        )
        .bind(&drop.path)
        .bind(&drop.created_by)
        .bind(&drop.owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create drop", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_many(&self, drops: Vec<NewDrop>) -> AppResult<u64> {
        if drops.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("INSERT INTO drops (path, created_by, last_edited_by, owner_id) ");
        builder.push_values(&drops, |mut row, drop| {
            row.push_bind(&drop.path)
                .push_bind(&drop.created_by)
                .push_bind(&drop.created_by)
                .push_bind(&drop.owner_id);
        });
        builder.push(" ON CONFLICT (path) DO NOTHING");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create drops", e))?;
        debug!(
            requested = drops.len(),
            created = result.rows_affected(),
            "Bulk created drops"
        );
        Ok(result.rows_affected())
    }

    async fn list_subtree(&self, target: &str) -> AppResult<Vec<Drop>> {
        if !path::is_directory(target) {
            return Ok(Vec::new());
        }
        let scope = Scope::of(target);
        sqlx::query_as::<_, Drop>(&format!(
            "SELECT * FROM drops WHERE {} ORDER BY path ASC",
            scope.clause
        ))
        .bind(&scope.value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list subtree", e))
    }

    async fn rename(
        &self,
        old_path: &str,
        new_path: &str,
        editor: &UserId,
        new_owner: &UserId,
    ) -> AppResult<u64> {
        let scope = Scope::of(old_path);
        // substr keeps whatever follows the old prefix; for a file it is empty.
        let result = sqlx::query(&format!(
            "UPDATE drops SET path = $2 || substr(path, char_length($3) + 1), \
             last_edited_by = $4, last_edited_at = NOW(), owner_id = $5 WHERE {}",
            scope.clause
        ))
        .bind(&scope.value)
        .bind(new_path)
        .bind(old_path)
        .bind(editor)
        .bind(new_owner)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename drop", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, target: &str) -> AppResult<u64> {
        let scope = Scope::of(target);
        let result = sqlx::query(&format!("DELETE FROM drops WHERE {}", scope.clause))
            .bind(&scope.value)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete drop", e))?;
        Ok(result.rows_affected())
    }
}
