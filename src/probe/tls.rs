//! TLS certificate introspection probe.
//!
//! Connects to a domain target, completes a handshake, and classifies the
//! presented leaf certificate's validity window. Peer verification is
//! disabled on purpose: the job is to inspect whatever the server presents,
//! so self-signed and expired certificates must survive the handshake
//! instead of being rejected by it.

use std::sync::Arc;

use chrono::Utc;
use log::debug;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::{TCP_CONNECT_TIMEOUT_SECS, TLS_DEFAULT_PORT, TLS_HANDSHAKE_TIMEOUT_SECS};
use crate::models::{CertificateState, CertificateStatus, ProbeOutcome, ProbeResult};

/// Certificate verifier that accepts everything.
///
/// Inspection, not trust: classification of expired/self-signed certificates
/// happens after the handshake, from the parsed certificate itself.
#[derive(Debug)]
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Executes one certificate check against a domain target's URL.
///
/// Non-https URLs short-circuit to `not_applicable`/up without touching the
/// network: a plain-http target is not down merely for lacking a
/// certificate. Connection or handshake failure is down + `not_reachable`;
/// every post-handshake path is up, with the certificate classified against
/// `warn_threshold_days`.
///
/// Never fails: every outcome is folded into the returned [`ProbeResult`].
pub async fn check(url: &str, warn_threshold_days: i64) -> ProbeResult {
    let parsed = match url::Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            return certificate_result(
                ProbeOutcome::Down,
                CertificateState::Error,
                None,
                None,
                Some(format!("invalid target URL: {e}")),
            )
        }
    };

    if parsed.scheme() != "https" {
        debug!("TLS probe: {url} is not https, skipping certificate check");
        return certificate_result(
            ProbeOutcome::Up,
            CertificateState::NotApplicable,
            None,
            None,
            None,
        );
    }

    let Some(host) = parsed.host_str().map(str::to_string) else {
        return certificate_result(
            ProbeOutcome::Down,
            CertificateState::Error,
            None,
            None,
            Some("target URL has no host".to_string()),
        );
    };
    let port = parsed.port().unwrap_or(TLS_DEFAULT_PORT);

    let server_name = match ServerName::try_from(host.clone()) {
        Ok(name) => name,
        Err(e) => {
            return certificate_result(
                ProbeOutcome::Down,
                CertificateState::Error,
                None,
                None,
                Some(format!("invalid server name {host:?}: {e}")),
            )
        }
    };

    debug!("TLS probe: connecting to {host}:{port}");
    let sock = match tokio::time::timeout(
        std::time::Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
        TcpStream::connect((host.as_str(), port)),
    )
    .await
    {
        Ok(Ok(sock)) => sock,
        Ok(Err(e)) => {
            return not_reachable(format!("failed to connect to {host}:{port}: {e}"));
        }
        Err(_) => {
            return not_reachable(format!(
                "connection to {host}:{port} timed out ({TCP_CONNECT_TIMEOUT_SECS}s)"
            ));
        }
    };

    // Provider pinned explicitly so the probe never depends on a
    // process-level default being installed.
    let config = match ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    {
        Ok(builder) => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth(),
        Err(e) => {
            return certificate_result(
                ProbeOutcome::Down,
                CertificateState::Error,
                None,
                None,
                Some(format!("TLS configuration error: {e}")),
            )
        }
    };
    let connector = TlsConnector::from(Arc::new(config));

    // The stream is dropped on every path out of this function, which closes
    // the socket.
    let tls_stream = match tokio::time::timeout(
        std::time::Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
        connector.connect(server_name, sock),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return not_reachable(format!("TLS handshake with {host}:{port} failed: {e}"));
        }
        Err(_) => {
            return not_reachable(format!(
                "TLS handshake with {host}:{port} timed out ({TLS_HANDSHAKE_TIMEOUT_SECS}s)"
            ));
        }
    };

    let (_, session) = tls_stream.get_ref();
    let leaf = session
        .peer_certificates()
        .and_then(|certs| certs.first().cloned());

    match leaf {
        Some(der) => match x509_parser::parse_x509_certificate(der.as_ref()) {
            Ok((_, cert)) => {
                let not_after_secs = cert.validity().not_after.timestamp();
                let now_secs = Utc::now().timestamp();
                let days = days_remaining(not_after_secs, now_secs);
                let state = classify(not_after_secs, now_secs, warn_threshold_days);
                certificate_result(
                    ProbeOutcome::Up,
                    state,
                    Some(days),
                    Some(not_after_secs * 1000),
                    None,
                )
            }
            Err(e) => certificate_result(
                ProbeOutcome::Up,
                CertificateState::Unavailable,
                None,
                None,
                Some(format!("unparseable certificate from {host}: {e}")),
            ),
        },
        None => certificate_result(
            ProbeOutcome::Up,
            CertificateState::Unavailable,
            None,
            None,
            Some(format!("no certificate presented by {host}")),
        ),
    }
}

/// Days until `not_after`, rounded up.
///
/// A certificate expiring later today is 0 days out; one that expired
/// yesterday is -1.
pub(crate) fn days_remaining(not_after_secs: i64, now_secs: i64) -> i64 {
    (not_after_secs - now_secs + 86_399).div_euclid(86_400)
}

/// Classifies a validity window against the warning threshold.
pub(crate) fn classify(not_after_secs: i64, now_secs: i64, warn_threshold_days: i64) -> CertificateState {
    if not_after_secs < now_secs {
        CertificateState::Expired
    } else if days_remaining(not_after_secs, now_secs) <= warn_threshold_days {
        CertificateState::Warning
    } else {
        CertificateState::Valid
    }
}

fn certificate_result(
    outcome: ProbeOutcome,
    state: CertificateState,
    days_remaining: Option<i64>,
    not_after_ms: Option<i64>,
    error: Option<String>,
) -> ProbeResult {
    ProbeResult {
        outcome,
        latency_ms: None,
        status_code: None,
        error,
        certificate: Some(CertificateStatus {
            state,
            days_remaining,
            not_after_ms,
        }),
    }
}

fn not_reachable(error: String) -> ProbeResult {
    certificate_result(
        ProbeOutcome::Down,
        CertificateState::NotReachable,
        None,
        None,
        Some(error),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = 1_700_000_000;
        assert_eq!(days_remaining(now + 5 * DAY, now), 5);
        assert_eq!(days_remaining(now + 5 * DAY + 1, now), 6);
        assert_eq!(days_remaining(now + 1, now), 1);
        assert_eq!(days_remaining(now, now), 0);
    }

    #[test]
    fn test_days_remaining_negative_for_expired() {
        let now = 1_700_000_000;
        assert_eq!(days_remaining(now - 1, now), 0);
        assert_eq!(days_remaining(now - DAY, now), -1);
        assert_eq!(days_remaining(now - 3 * DAY, now), -3);
    }

    #[test]
    fn test_classify_expired() {
        let now = 1_700_000_000;
        assert_eq!(classify(now - DAY, now, 30), CertificateState::Expired);
        assert_eq!(classify(now - 1, now, 30), CertificateState::Expired);
    }

    #[test]
    fn test_classify_warning_inside_threshold() {
        let now = 1_700_000_000;
        assert_eq!(classify(now + 5 * DAY, now, 30), CertificateState::Warning);
        assert_eq!(classify(now + 30 * DAY, now, 30), CertificateState::Warning);
    }

    #[test]
    fn test_classify_valid_outside_threshold() {
        let now = 1_700_000_000;
        assert_eq!(
            classify(now + 31 * DAY, now, 30),
            CertificateState::Valid
        );
        assert_eq!(classify(now + 365 * DAY, now, 30), CertificateState::Valid);
    }

    #[tokio::test]
    async fn test_plain_http_target_short_circuits() {
        // Host is unreachable on purpose; a non-https URL must never touch
        // the network.
        let result = check("http://192.0.2.1/health", 30).await;
        assert_eq!(result.outcome, ProbeOutcome::Up);
        let cert = result.certificate.unwrap();
        assert_eq!(cert.state, CertificateState::NotApplicable);
        assert!(cert.days_remaining.is_none());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_down_not_reachable() {
        let result = check("https://127.0.0.1:1/", 30).await;
        assert_eq!(result.outcome, ProbeOutcome::Down);
        let cert = result.certificate.unwrap();
        assert_eq!(cert.state, CertificateState::NotReachable);
        assert!(cert.days_remaining.is_none());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_invalid_url_reports_error_state() {
        let result = check("not a url", 30).await;
        assert_eq!(result.outcome, ProbeOutcome::Down);
        assert_eq!(
            result.certificate.unwrap().state,
            CertificateState::Error
        );
    }
}
