//! Probe status writes.
//!
//! These are the only writers of the `targets` status columns. Each tick
//! calls exactly one of them, so per-target writes never race.

use sqlx::SqlitePool;

use crate::error_handling::{truncate_error_message, DatabaseError};
use crate::models::{CertificateState, ProbeOutcome};

/// Writes an API target's liveness outcome.
///
/// `error` is cleared (set NULL) on a healthy probe, so stale messages never
/// outlive the failure they described.
pub async fn update_status(
    pool: &SqlitePool,
    target_id: i64,
    outcome: ProbeOutcome,
    latency_ms: Option<i64>,
    checked_at_ms: i64,
    error: Option<&str>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE targets
         SET last_outcome = ?, last_latency_ms = ?, last_checked_at_ms = ?, last_error = ?
         WHERE id = ?",
    )
    .bind(outcome)
    .bind(latency_ms)
    .bind(checked_at_ms)
    .bind(error.map(truncate_error_message))
    .bind(target_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Writes a domain target's certificate introspection outcome.
pub async fn update_certificate(
    pool: &SqlitePool,
    target_id: i64,
    state: CertificateState,
    days_remaining: Option<i64>,
    outcome: ProbeOutcome,
    checked_at_ms: i64,
    error: Option<&str>,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "UPDATE targets
         SET certificate_state = ?, certificate_days_remaining = ?, last_outcome = ?,
             last_checked_at_ms = ?, last_error = ?
         WHERE id = ?",
    )
    .bind(state)
    .bind(days_remaining)
    .bind(outcome)
    .bind(checked_at_ms)
    .bind(error.map(truncate_error_message))
    .bind(target_id)
    .execute(pool)
    .await?;
    Ok(())
}
