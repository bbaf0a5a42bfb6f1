//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tokio::sync::mpsc;

use uptime_sentinel::config::AlertDefaults;
use uptime_sentinel::models::{AlertEvent, Target, TargetKind};
use uptime_sentinel::{run_migrations, Scheduler};

/// Scaled-down scheduling unit: one "minute" of target interval becomes
/// 200ms of wall-clock, which keeps cadence assertions fast but leaves
/// comfortable margins around tick boundaries.
pub const UNIT: Duration = Duration::from_millis(200);

/// Sleeps for a fraction of the scaled unit.
pub async fn sleep_units(units: f64) {
    tokio::time::sleep(UNIT.mul_f64(units)).await;
}

/// In-memory pool with migrations applied.
///
/// Single connection: with `sqlite::memory:` every pooled connection would
/// otherwise see its own empty database.
pub async fn create_test_pool() -> Arc<SqlitePool> {
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
    Arc::new(pool)
}

/// Inserts a target row and returns the full `Target`.
pub async fn insert_target(
    pool: &SqlitePool,
    kind: TargetKind,
    url: &str,
    interval_minutes: i64,
) -> Target {
    let id: i64 = sqlx::query(
        "INSERT INTO targets (user_id, name, url, kind, interval_minutes, active)
         VALUES (1, 'integration target', ?, ?, ?, 1)
         RETURNING id",
    )
    .bind(url)
    .bind(kind)
    .bind(interval_minutes)
    .fetch_one(pool)
    .await
    .expect("Failed to insert target")
    .get(0);

    uptime_sentinel::storage::get_target(pool, id)
        .await
        .expect("Failed to fetch target")
        .expect("target just inserted")
}

/// A scheduler wired to the pool with the scaled tick unit and a fresh
/// alert channel. The receiver is returned so tests can observe emitted
/// alert events.
pub fn test_scheduler(pool: &Arc<SqlitePool>) -> (Scheduler, mpsc::Receiver<AlertEvent>) {
    let (alert_tx, alert_rx) = mpsc::channel(16);
    let scheduler = Scheduler::new(
        Arc::clone(pool),
        Arc::new(reqwest::Client::new()),
        alert_tx,
        AlertDefaults::default(),
        1,
    )
    .with_tick_unit(UNIT);
    (scheduler, alert_rx)
}

/// Number of monitoring_log rows for a target.
pub async fn tick_count(pool: &SqlitePool, target_id: i64) -> i64 {
    uptime_sentinel::storage::count_log_entries(pool, target_id)
        .await
        .expect("Failed to count log entries")
}

/// The target's `last_checked_at_ms` status column.
pub async fn last_checked_at(pool: &SqlitePool, target_id: i64) -> Option<i64> {
    sqlx::query("SELECT last_checked_at_ms FROM targets WHERE id = ?")
        .bind(target_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read status row")
        .get(0)
}
