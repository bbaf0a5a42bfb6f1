//! End-to-end pipeline scenarios: target creation through probing,
//! persistence, and alert emission.

mod helpers;

use helpers::{create_test_pool, insert_target, last_checked_at, sleep_units, test_scheduler, tick_count};
use httptest::{matchers::*, responders::*, Expectation, Server};
use sqlx::Row;
use uptime_sentinel::models::{AlertKind, TargetKind};

#[tokio::test]
async fn api_target_gets_immediate_status_then_interval_cadence() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/health"))
            .times(2..)
            .respond_with(status_code(200)),
    );

    let pool = create_test_pool().await;
    let target = insert_target(
        &pool,
        TargetKind::Api,
        &server.url("/health").to_string(),
        5,
    )
    .await;
    let (scheduler, _alert_rx) = test_scheduler(&pool);

    scheduler.schedule(&target);

    // Immediately after creation a status row exists (the immediate tick).
    sleep_units(0.5).await;
    let first_checked = last_checked_at(&pool, target.id).await.expect("status set");
    assert_eq!(tick_count(&pool, target.id).await, 1);

    let row = sqlx::query(
        "SELECT last_outcome, last_latency_ms, last_error FROM targets WHERE id = ?",
    )
    .bind(target.id)
    .fetch_one(pool.as_ref())
    .await
    .unwrap();
    assert_eq!(row.get::<String, _>(0), "up");
    assert!(row.get::<Option<i64>, _>(1).is_some());
    assert!(row.get::<Option<String>, _>(2).is_none());

    // One interval later: exactly two log rows, and the checked-at stamp
    // has advanced.
    sleep_units(5.0).await;
    assert_eq!(tick_count(&pool, target.id).await, 2);
    let second_checked = last_checked_at(&pool, target.id).await.expect("status set");
    assert!(second_checked > first_checked);

    scheduler.stop_all().await;
}

#[tokio::test]
async fn failing_api_target_records_down_and_emits_alert() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/health"))
            .times(1..)
            .respond_with(status_code(503)),
    );

    let pool = create_test_pool().await;
    let target = insert_target(
        &pool,
        TargetKind::Api,
        &server.url("/health").to_string(),
        5,
    )
    .await;
    let (scheduler, mut alert_rx) = test_scheduler(&pool);

    scheduler.schedule(&target);

    let event = tokio::time::timeout(std::time::Duration::from_secs(2), alert_rx.recv())
        .await
        .expect("alert should arrive within the immediate tick")
        .expect("channel open");
    assert_eq!(event.user_id, target.user_id);
    match event.kind {
        AlertKind::ApiDown { url, error } => {
            assert_eq!(url, target.url);
            assert!(error.contains("503"), "got: {error}");
        }
        other => panic!("unexpected alert kind: {other:?}"),
    }

    let row = sqlx::query("SELECT last_outcome, last_error FROM targets WHERE id = ?")
        .bind(target.id)
        .fetch_one(pool.as_ref())
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>(0), "down");
    assert!(row.get::<Option<String>, _>(1).unwrap().contains("503"));

    let log_row = sqlx::query(
        "SELECT outcome, status_code FROM monitoring_log WHERE target_id = ? ORDER BY id LIMIT 1",
    )
    .bind(target.id)
    .fetch_one(pool.as_ref())
    .await
    .unwrap();
    assert_eq!(log_row.get::<String, _>(0), "down");
    assert_eq!(log_row.get::<i64, _>(1), 503);

    scheduler.stop_all().await;
}

#[tokio::test]
async fn plain_http_domain_target_is_up_and_not_applicable() {
    let pool = create_test_pool().await;
    let target = insert_target(&pool, TargetKind::Domain, "http://192.0.2.1/", 5).await;
    let (scheduler, mut alert_rx) = test_scheduler(&pool);

    scheduler.schedule(&target);
    sleep_units(0.5).await;

    let row = sqlx::query(
        "SELECT last_outcome, certificate_state, certificate_days_remaining
         FROM targets WHERE id = ?",
    )
    .bind(target.id)
    .fetch_one(pool.as_ref())
    .await
    .unwrap();
    assert_eq!(row.get::<String, _>(0), "up");
    assert_eq!(row.get::<String, _>(1), "not_applicable");
    assert!(row.get::<Option<i64>, _>(2).is_none());

    // Not alert-worthy.
    assert!(alert_rx.try_recv().is_err());

    scheduler.stop_all().await;
}

#[tokio::test]
async fn unreachable_domain_target_is_down_not_reachable() {
    let pool = create_test_pool().await;
    let target = insert_target(&pool, TargetKind::Domain, "https://127.0.0.1:1/", 5).await;
    let (scheduler, _alert_rx) = test_scheduler(&pool);

    scheduler.schedule(&target);
    sleep_units(1.0).await;

    let row = sqlx::query(
        "SELECT last_outcome, certificate_state, last_error FROM targets WHERE id = ?",
    )
    .bind(target.id)
    .fetch_one(pool.as_ref())
    .await
    .unwrap();
    assert_eq!(row.get::<String, _>(0), "down");
    assert_eq!(row.get::<String, _>(1), "not_reachable");
    assert!(row.get::<Option<String>, _>(2).is_some());

    scheduler.stop_all().await;
}

#[tokio::test]
async fn on_disk_database_round_trip() {
    // The production pool path: file creation, WAL mode, migrations.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sentinel.db");

    let pool = uptime_sentinel::init_db_pool_with_path(&db_path)
        .await
        .unwrap();
    uptime_sentinel::run_migrations(&pool).await.unwrap();
    assert!(db_path.exists());

    let target = insert_target(&pool, TargetKind::Domain, "http://192.0.2.1/", 1).await;
    let fetched = uptime_sentinel::storage::get_target(&pool, target.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.url, "http://192.0.2.1/");
}
