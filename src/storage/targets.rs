//! Target and proxy reads consumed by the scheduler.

use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::models::{ProxyDescriptor, Target};

const TARGET_COLUMNS: &str = "id, user_id, name, url, kind, interval_minutes, proxy_id, active";

/// Loads every active target; used once at scheduler startup to rebuild the
/// in-memory schedule.
pub async fn list_active_targets(pool: &SqlitePool) -> Result<Vec<Target>, DatabaseError> {
    let targets = sqlx::query_as::<_, Target>(&format!(
        "SELECT {TARGET_COLUMNS} FROM targets WHERE active = 1"
    ))
    .fetch_all(pool)
    .await?;
    Ok(targets)
}

/// Fetches a single target by id.
pub async fn get_target(pool: &SqlitePool, id: i64) -> Result<Option<Target>, DatabaseError> {
    let target = sqlx::query_as::<_, Target>(&format!(
        "SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(target)
}

/// Fetches the proxy descriptor a target routes through, if any.
pub async fn get_proxy(pool: &SqlitePool, id: i64) -> Result<Option<ProxyDescriptor>, DatabaseError> {
    let proxy = sqlx::query_as::<_, ProxyDescriptor>(
        "SELECT host, port, protocol, username, password FROM proxies WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetKind;
    use crate::storage::test_helpers::{create_test_pool, insert_test_target};

    #[tokio::test]
    async fn test_list_active_targets_skips_inactive() {
        let pool = create_test_pool().await;
        insert_test_target(&pool, TargetKind::Api, "https://a.example/health", 5, true).await;
        insert_test_target(&pool, TargetKind::Api, "https://b.example/health", 5, false).await;

        let active = list_active_targets(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].url, "https://a.example/health");
    }

    #[tokio::test]
    async fn test_get_target_round_trip() {
        let pool = create_test_pool().await;
        let id =
            insert_test_target(&pool, TargetKind::Domain, "https://example.com", 60, true).await;

        let target = get_target(&pool, id).await.unwrap().unwrap();
        assert_eq!(target.kind, TargetKind::Domain);
        assert_eq!(target.interval_minutes, 60);
        assert!(target.active);
    }

    #[tokio::test]
    async fn test_get_target_missing() {
        let pool = create_test_pool().await;
        assert!(get_target(&pool, 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_proxy_round_trip() {
        let pool = create_test_pool().await;
        sqlx::query(
            "INSERT INTO proxies (user_id, host, port, protocol, username, password)
             VALUES (1, 'proxy.internal', 3128, 'http', 'scout', 'hunter2')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let proxy = get_proxy(&pool, 1).await.unwrap().unwrap();
        assert_eq!(proxy.host, "proxy.internal");
        assert_eq!(proxy.port, 3128);
        assert_eq!(proxy.username.as_deref(), Some("scout"));
    }
}
