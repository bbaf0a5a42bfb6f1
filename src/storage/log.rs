//! Append-only monitoring history.
//!
//! One row per probe tick. Rows are never mutated; they disappear only via
//! cascade when their target is deleted. Retention is a deployment concern.

use sqlx::SqlitePool;

use crate::error_handling::{truncate_error_message, DatabaseError};
use crate::models::{MonitoringLogEntry, ProbeOutcome};

/// Appends one probe observation to the history log.
pub async fn append_log(
    pool: &SqlitePool,
    target_id: i64,
    outcome: ProbeOutcome,
    latency_ms: Option<i64>,
    status_code: Option<i64>,
    error: Option<&str>,
    observed_at_ms: i64,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO monitoring_log (target_id, outcome, latency_ms, status_code, error, observed_at_ms)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(target_id)
    .bind(outcome)
    .bind(latency_ms)
    .bind(status_code)
    .bind(error.map(truncate_error_message))
    .bind(observed_at_ms)
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent history entries for one target, newest first.
///
/// Read side for the external dashboard/CRUD layer.
pub async fn recent_log_entries(
    pool: &SqlitePool,
    target_id: i64,
    limit: i64,
) -> Result<Vec<MonitoringLogEntry>, DatabaseError> {
    let entries = sqlx::query_as::<_, MonitoringLogEntry>(
        "SELECT id, target_id, outcome, latency_ms, status_code, error, observed_at_ms
         FROM monitoring_log WHERE target_id = ? ORDER BY observed_at_ms DESC LIMIT ?",
    )
    .bind(target_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Number of history rows recorded for a target.
pub async fn count_log_entries(pool: &SqlitePool, target_id: i64) -> Result<i64, DatabaseError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM monitoring_log WHERE target_id = ?")
            .bind(target_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
