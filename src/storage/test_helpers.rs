//! Shared test helpers for storage and scheduler tests.

#[cfg(test)]
use std::str::FromStr;

#[cfg(test)]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
#[cfg(test)]
use sqlx::{Row, SqlitePool};

#[cfg(test)]
use crate::models::TargetKind;
#[cfg(test)]
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
///
/// In-memory, single connection: with `sqlite::memory:` every pooled
/// connection would otherwise see its own empty database.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory connection string")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Inserts a target row and returns its id.
#[cfg(test)]
pub async fn insert_test_target(
    pool: &SqlitePool,
    kind: TargetKind,
    url: &str,
    interval_minutes: i64,
    active: bool,
) -> i64 {
    sqlx::query(
        "INSERT INTO targets (user_id, name, url, kind, interval_minutes, active)
         VALUES (1, 'test target', ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(url)
    .bind(kind)
    .bind(interval_minutes)
    .bind(active)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test target")
    .get::<i64, _>(0)
}
