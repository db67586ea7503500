//! # Database Migrations
//!
//! SQL files under `migrations/postgres/` embedded at compile time.
//!
//! ## Adding New Migrations
//!
//! 1. Create `NNNN_description.sql` in `migrations/postgres/` with the next number
//! 2. **NEVER** edit an applied migration; add a new one
//! 3. Constraint names are part of the error mapping (see `error.rs`)

use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Applies pending migrations. Idempotent.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!(available = MIGRATOR.migrations.len(), "Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// `(embedded, applied)` migration counts.
///
/// A database that never ran migrations has no `_sqlx_migrations` table
/// and reports zero applied.
pub async fn migration_status(pool: &PgPool) -> (usize, usize) {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    (total, applied as usize)
}
