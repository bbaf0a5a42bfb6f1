//! Core domain types shared by the scheduler, probes, storage, and alerting.

use chrono::DateTime;
use serde::Serialize;
use sqlx::FromRow;
use strum_macros::EnumIter;

/// What a target is and therefore which probe checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type, EnumIter)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// An HTTP(S) API endpoint checked for liveness and latency.
    Api,
    /// A TLS-bearing domain checked for certificate validity.
    Domain,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Api => "api",
            TargetKind::Domain => "domain",
        }
    }
}

/// The up/down liveness verdict of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type, EnumIter)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    Up,
    Down,
}

impl ProbeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeOutcome::Up => "up",
            ProbeOutcome::Down => "down",
        }
    }
}

/// Classification of a domain's TLS certificate validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type, EnumIter)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CertificateState {
    /// Certificate is valid and outside the warning window.
    Valid,
    /// Certificate expires within the warning threshold.
    Warning,
    /// Certificate's notAfter is in the past.
    Expired,
    /// Server completed a handshake but presented no parseable certificate.
    Unavailable,
    /// Certificate field extraction itself failed.
    Error,
    /// Target URL is not https; there is no certificate to inspect.
    NotApplicable,
    /// TCP connect or TLS handshake failed; nothing was presented.
    NotReachable,
}

impl CertificateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateState::Valid => "valid",
            CertificateState::Warning => "warning",
            CertificateState::Expired => "expired",
            CertificateState::Unavailable => "unavailable",
            CertificateState::Error => "error",
            CertificateState::NotApplicable => "not_applicable",
            CertificateState::NotReachable => "not_reachable",
        }
    }
}

/// A monitored endpoint as stored in the `targets` table.
///
/// Status columns (`last_outcome`, `last_checked_at_ms`, ...) are not part of
/// this struct: they are written by probe ticks and read by the external
/// CRUD/dashboard layer, never by the scheduler itself.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Target {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub url: String,
    pub kind: TargetKind,
    pub interval_minutes: i64,
    pub proxy_id: Option<i64>,
    pub active: bool,
}

/// An outbound proxy a probe routes through, as stored in `proxies`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProxyDescriptor {
    pub host: String,
    pub port: i64,
    pub protocol: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyDescriptor {
    /// Proxy URL in the form `protocol://host:port` (credentials applied
    /// separately via basic auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Certificate portion of a domain probe's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateStatus {
    pub state: CertificateState,
    pub days_remaining: Option<i64>,
    /// Leaf certificate notAfter as epoch millis, when one was extracted.
    pub not_after_ms: Option<i64>,
}

/// The structured outcome of one probe execution.
///
/// Probes are infallible: every failure mode is folded into this struct
/// rather than surfaced as an `Err`, so a tick always has something to
/// persist.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub outcome: ProbeOutcome,
    pub latency_ms: Option<i64>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    /// Present for domain probes only.
    pub certificate: Option<CertificateStatus>,
}

impl ProbeResult {
    /// A down result carrying only an error message.
    pub fn down(error: impl Into<String>) -> Self {
        Self {
            outcome: ProbeOutcome::Down,
            latency_ms: None,
            status_code: None,
            error: Some(error.into()),
            certificate: None,
        }
    }
}

/// One append-only history row, as stored in `monitoring_log`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonitoringLogEntry {
    pub id: i64,
    pub target_id: i64,
    pub outcome: ProbeOutcome,
    pub latency_ms: Option<i64>,
    pub status_code: Option<i64>,
    pub error: Option<String>,
    pub observed_at_ms: i64,
}

/// Per-user alert routing, as stored in `alert_preferences`.
///
/// Every field is optional; the dispatcher falls back field-by-field to the
/// process-wide defaults.
#[derive(Debug, Clone, Default, FromRow)]
pub struct AlertPreference {
    pub user_id: i64,
    pub email_to: Option<String>,
    pub snmp_host: Option<String>,
    pub snmp_community: Option<String>,
    pub snmp_oid_api_down: Option<String>,
    pub snmp_oid_cert_expiring: Option<String>,
    pub cert_warn_days: Option<i64>,
}

/// An alert-worthy probe result, emitted by the scheduler and consumed by
/// the notification dispatcher.
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub user_id: i64,
    pub kind: AlertKind,
}

/// The two alert conditions the pipeline raises.
#[derive(Debug, Clone)]
pub enum AlertKind {
    ApiDown {
        url: String,
        error: String,
    },
    CertificateExpiring {
        url: String,
        state: CertificateState,
        not_after_ms: Option<i64>,
        days_remaining: Option<i64>,
    },
}

impl AlertKind {
    /// Short human-readable description used in trap values and log lines.
    pub fn describe(&self) -> String {
        match self {
            AlertKind::ApiDown { url, error } => {
                format!("API endpoint {url} is down: {error}")
            }
            AlertKind::CertificateExpiring {
                url,
                state,
                not_after_ms,
                days_remaining,
            } => {
                let expiry = not_after_ms
                    .and_then(|ms| DateTime::from_timestamp_millis(ms))
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                match state {
                    CertificateState::Expired => {
                        format!("Certificate for {url} expired on {expiry}")
                    }
                    _ => format!(
                        "Certificate for {url} expires on {expiry} ({} day(s) remaining)",
                        days_remaining.unwrap_or(0)
                    ),
                }
            }
        }
    }
}
