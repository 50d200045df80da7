//! Watch repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;
use puddle_core::types::{UserId, path};
use puddle_entity::watch::Watch;

use super::Scope;
use crate::store::WatchStore;

/// PostgreSQL [`WatchStore`].
#[derive(Debug, Clone)]
pub struct WatchRepository {
    pool: PgPool,
}

impl WatchRepository {
    /// Create a new watch repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchStore for WatchRepository {
    async fn add(&self, user_id: &UserId, path: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO watches (user_id, path) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(path)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to add watch", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, user_id: &UserId, path: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watches WHERE user_id = $1 AND path = $2")
            .bind(user_id)
            .bind(path)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove watch", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_all_for_path(&self, target: &str) -> AppResult<Vec<Watch>> {
        let scope = Scope::of(target);
        sqlx::query_as::<_, Watch>(&format!(
            "DELETE FROM watches WHERE {} RETURNING *",
            scope.clause
        ))
        .bind(&scope.value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove watches", e))
    }

    async fn remove_all_for_user(&self, user_id: &UserId) -> AppResult<Vec<Watch>> {
        sqlx::query_as::<_, Watch>("DELETE FROM watches WHERE user_id = $1 RETURNING *")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to remove user watches", e)
            })
    }

    async fn list(&self, user_id: &UserId) -> AppResult<Vec<Watch>> {
        sqlx::query_as::<_, Watch>("SELECT * FROM watches WHERE user_id = $1 ORDER BY path ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list watches", e))
    }

    async fn list_watchers(&self, path: &str) -> AppResult<Vec<Watch>> {
        sqlx::query_as::<_, Watch>("SELECT * FROM watches WHERE path = $1 ORDER BY user_id ASC")
            .bind(path)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list watchers", e))
    }

    async fn list_subtree(&self, target: &str) -> AppResult<Vec<Watch>> {
        let scope = Scope::of(target);
        sqlx::query_as::<_, Watch>(&format!(
            "SELECT * FROM watches WHERE {} ORDER BY path, user_id",
            scope.clause
        ))
        .bind(&scope.value)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list watches", e))
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> AppResult<u64> {
        let from = Scope::of(old_path);
        let to = Scope::of(new_path);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        if !path::is_within(new_path, old_path) {
            sqlx::query(&format!("DELETE FROM watches WHERE {}", to.clause))
                .bind(&to.value)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to clear destination", e)
                })?;
        }

        let result = sqlx::query(&format!(
            "UPDATE watches SET path = $2 || substr(path, char_length($3) + 1) WHERE {}",
            from.clause
        ))
        .bind(&from.value)
        .bind(new_path)
        .bind(old_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename watches", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rename", e)
        })?;
        Ok(result.rows_affected())
    }
}
