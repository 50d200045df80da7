//! Embedded schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use puddle_core::error::{AppError, ErrorKind};
use puddle_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every migration that has not run yet.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!(
        available = MIGRATOR.migrations.len(),
        "Applying schema migrations"
    );

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Schema migration failed: {e}"),
            e,
        )
    })
}
