//! Database connection pool management.
//!
//! Initializes the SQLite connection pool with:
//! - WAL mode enabled for concurrent access from overlapping probe ticks
//! - Foreign keys enforced (monitoring history cascade-deletes with its target)
//! - Automatic database file creation

use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Initializes and returns a database connection pool.
///
/// Creates the database file if it doesn't exist, enables WAL mode, and
/// turns foreign-key enforcement on. Foreign keys are set through the
/// connect options rather than a one-off `PRAGMA` because the pragma is
/// per-connection and the pool hands out many.
pub async fn init_db_pool_with_path(db_path: &Path) -> Result<Arc<SqlitePool>, DatabaseError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await.map_err(|e| {
        error!("Failed to connect to database at {}: {e}", db_path.display());
        DatabaseError::SqlError(e)
    })?;

    info!("Database pool ready at {}", db_path.display());
    Ok(Arc::new(pool))
}

/// Runs SQLx migrations located in the `migrations/` directory.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir.as_path())
        .await
        .map_err(DatabaseError::MigrationError)?;
    migrator.run(pool).await?;
    Ok(())
}
