//! Per-tick behavior: probe, persist, alert.
//!
//! Every tick boundary is a hard failure-containment boundary. Nothing that
//! happens inside a tick — probe failure, store failure, a panic — may
//! escape into the timer loop; the worst case is a target recorded as down
//! with an explanatory error.

use std::panic::AssertUnwindSafe;

use chrono::Utc;
use futures::FutureExt;
use log::{error, warn};

use crate::initialization::build_proxy_client;
use crate::models::{
    AlertEvent, AlertKind, CertificateState, ProbeOutcome, ProbeResult, Target, TargetKind,
};
use crate::probe;
use crate::scheduler::SchedulerInner;
use crate::storage;

/// Runs one tick for a target, containing every failure mode.
pub(crate) async fn run_tick(inner: &SchedulerInner, target: &Target) {
    let tick = AssertUnwindSafe(execute_tick(inner, target)).catch_unwind();
    if let Err(panic) = tick.await {
        let message = panic_message(panic);
        error!("Probe tick for target {} panicked: {message}", target.id);

        // A crashing probe must still produce an observable status instead
        // of silently leaving stale data.
        let checked_at_ms = Utc::now().timestamp_millis();
        let detail = format!("probe aborted unexpectedly: {message}");
        if let Err(e) = storage::update_status(
            &inner.pool,
            target.id,
            ProbeOutcome::Down,
            None,
            checked_at_ms,
            Some(&detail),
        )
        .await
        {
            error!(
                "Failed to record aborted probe for target {}: {e}",
                target.id
            );
        }
    }
}

async fn execute_tick(inner: &SchedulerInner, target: &Target) {
    let result = match target.kind {
        TargetKind::Api => api_probe(inner, target).await,
        TargetKind::Domain => {
            let threshold =
                storage::effective_cert_warn_days(&inner.pool, target.user_id, &inner.defaults)
                    .await;
            probe::tls::check(&target.url, threshold).await
        }
    };

    persist_result(inner, target, &result).await;

    if let Some(event) = alert_event(target, &result) {
        // Fire-and-forget: the dispatcher consumes the channel on its own
        // task, so neither its latency nor its failures reach this tick.
        if let Err(e) = inner.alert_tx.try_send(event) {
            warn!("Dropping alert for target {}: {e}", target.id);
        }
    }
}

/// Runs the HTTP probe, routing through the target's proxy when one is
/// configured.
///
/// A proxy that cannot be loaded or built is reported as a down result: the
/// probe cannot honor the target's transport configuration, and probing
/// around it would report liveness the user's network path may not have.
async fn api_probe(inner: &SchedulerInner, target: &Target) -> ProbeResult {
    match target.proxy_id {
        None => probe::http::check(&inner.client, &target.url).await,
        Some(proxy_id) => {
            let descriptor = match storage::get_proxy(&inner.pool, proxy_id).await {
                Ok(Some(descriptor)) => descriptor,
                Ok(None) => {
                    return ProbeResult::down(format!("proxy {proxy_id} not found"));
                }
                Err(e) => {
                    return ProbeResult::down(format!("failed to load proxy {proxy_id}: {e}"));
                }
            };
            match build_proxy_client(inner.probe_timeout_seconds, &descriptor) {
                Ok(client) => probe::http::check(&client, &target.url).await,
                Err(e) => ProbeResult::down(format!("proxy {proxy_id} unusable: {e}")),
            }
        }
    }
}

/// Writes the probe result to the store: status columns plus one history
/// row. Store failures are logged and swallowed; the next tick re-probes
/// and re-writes (no in-tick retry).
async fn persist_result(inner: &SchedulerInner, target: &Target, result: &ProbeResult) {
    let checked_at_ms = Utc::now().timestamp_millis();

    let status_write = match &result.certificate {
        Some(cert) => {
            storage::update_certificate(
                &inner.pool,
                target.id,
                cert.state,
                cert.days_remaining,
                result.outcome,
                checked_at_ms,
                result.error.as_deref(),
            )
            .await
        }
        None => {
            storage::update_status(
                &inner.pool,
                target.id,
                result.outcome,
                result.latency_ms,
                checked_at_ms,
                result.error.as_deref(),
            )
            .await
        }
    };
    if let Err(e) = status_write {
        error!(
            "Failed to persist probe status for target {}: {e}",
            target.id
        );
    }

    if let Err(e) = storage::append_log(
        &inner.pool,
        target.id,
        result.outcome,
        result.latency_ms,
        result.status_code.map(i64::from),
        result.error.as_deref(),
        checked_at_ms,
    )
    .await
    {
        error!(
            "Failed to append monitoring log for target {}: {e}",
            target.id
        );
    }
}

/// Decides whether a result crosses the alert threshold.
///
/// API targets alert when down. Domain targets alert when the certificate is
/// expired, or inside the warning window (classification against the
/// effective threshold already happened in the probe).
fn alert_event(target: &Target, result: &ProbeResult) -> Option<AlertEvent> {
    match target.kind {
        TargetKind::Api => {
            if result.outcome == ProbeOutcome::Down {
                Some(AlertEvent {
                    user_id: target.user_id,
                    kind: AlertKind::ApiDown {
                        url: target.url.clone(),
                        error: result
                            .error
                            .clone()
                            .unwrap_or_else(|| "no response".to_string()),
                    },
                })
            } else {
                None
            }
        }
        TargetKind::Domain => {
            let cert = result.certificate.as_ref()?;
            match cert.state {
                CertificateState::Expired | CertificateState::Warning => Some(AlertEvent {
                    user_id: target.user_id,
                    kind: AlertKind::CertificateExpiring {
                        url: target.url.clone(),
                        state: cert.state,
                        not_after_ms: cert.not_after_ms,
                        days_remaining: cert.days_remaining,
                    },
                }),
                _ => None,
            }
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CertificateStatus;

    fn api_target() -> Target {
        Target {
            id: 1,
            user_id: 7,
            name: "api".to_string(),
            url: "https://service.example/health".to_string(),
            kind: TargetKind::Api,
            interval_minutes: 5,
            proxy_id: None,
            active: true,
        }
    }

    fn domain_target() -> Target {
        Target {
            kind: TargetKind::Domain,
            url: "https://example.com".to_string(),
            ..api_target()
        }
    }

    fn domain_result(state: CertificateState, days: Option<i64>) -> ProbeResult {
        ProbeResult {
            outcome: ProbeOutcome::Up,
            latency_ms: None,
            status_code: None,
            error: None,
            certificate: Some(CertificateStatus {
                state,
                days_remaining: days,
                not_after_ms: None,
            }),
        }
    }

    #[test]
    fn test_api_down_raises_alert() {
        let event = alert_event(&api_target(), &ProbeResult::down("timed out")).unwrap();
        assert_eq!(event.user_id, 7);
        match event.kind {
            AlertKind::ApiDown { url, error } => {
                assert_eq!(url, "https://service.example/health");
                assert_eq!(error, "timed out");
            }
            other => panic!("unexpected alert kind: {other:?}"),
        }
    }

    #[test]
    fn test_api_up_raises_nothing() {
        let result = ProbeResult {
            outcome: ProbeOutcome::Up,
            latency_ms: Some(12),
            status_code: Some(200),
            error: None,
            certificate: None,
        };
        assert!(alert_event(&api_target(), &result).is_none());
    }

    #[test]
    fn test_expired_certificate_raises_alert() {
        let event =
            alert_event(&domain_target(), &domain_result(CertificateState::Expired, Some(-1)))
                .unwrap();
        assert!(matches!(
            event.kind,
            AlertKind::CertificateExpiring {
                state: CertificateState::Expired,
                ..
            }
        ));
    }

    #[test]
    fn test_warning_certificate_raises_alert() {
        let event =
            alert_event(&domain_target(), &domain_result(CertificateState::Warning, Some(5)))
                .unwrap();
        assert!(matches!(
            event.kind,
            AlertKind::CertificateExpiring {
                days_remaining: Some(5),
                ..
            }
        ));
    }

    #[test]
    fn test_valid_and_not_applicable_raise_nothing() {
        for state in [
            CertificateState::Valid,
            CertificateState::NotApplicable,
            CertificateState::Unavailable,
        ] {
            assert!(
                alert_event(&domain_target(), &domain_result(state, None)).is_none(),
                "state {state:?} should not alert"
            );
        }
    }

    #[test]
    fn test_unreachable_domain_raises_nothing() {
        // Down-but-not-expired domains are a liveness matter surfaced by the
        // status row, not a certificate alert.
        let mut result = domain_result(CertificateState::NotReachable, None);
        result.outcome = ProbeOutcome::Down;
        assert!(alert_event(&domain_target(), &result).is_none());
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("boom".to_string())), "boom");
        assert_eq!(panic_message(Box::new(17u32)), "unknown panic payload");
    }
}
