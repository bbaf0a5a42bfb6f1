//! Per-user alert preference reads.

use sqlx::SqlitePool;

use crate::config::AlertDefaults;
use crate::error_handling::DatabaseError;
use crate::models::AlertPreference;

/// Fetches a user's alert preference row, if one exists.
///
/// Field-level fallback to process defaults is the dispatcher's job; this
/// returns the row as stored.
pub async fn get_alert_preference(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<AlertPreference>, DatabaseError> {
    let preference = sqlx::query_as::<_, AlertPreference>(
        "SELECT user_id, email_to, snmp_host, snmp_community, snmp_oid_api_down,
                snmp_oid_cert_expiring, cert_warn_days
         FROM alert_preferences WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(preference)
}

/// The certificate warning threshold in effect for a user.
///
/// A store failure here falls back to the process default: the probe must
/// still run and classify with *some* threshold.
pub async fn effective_cert_warn_days(
    pool: &SqlitePool,
    user_id: i64,
    defaults: &AlertDefaults,
) -> i64 {
    match get_alert_preference(pool, user_id).await {
        Ok(preference) => preference
            .and_then(|p| p.cert_warn_days)
            .unwrap_or(defaults.cert_warn_days),
        Err(e) => {
            log::warn!(
                "Failed to load alert preference for user {user_id}, using default threshold: {e}"
            );
            defaults.cert_warn_days
        }
    }
}
