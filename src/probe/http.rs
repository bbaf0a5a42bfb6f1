//! HTTP liveness/latency probe.
//!
//! One GET per tick. Any application-level response with a status below 500
//! counts as up, client errors included: the endpoint answered, which is
//! what liveness means here. 5xx and transport failures are down.

use std::time::Instant;

use log::debug;

use crate::models::{ProbeOutcome, ProbeResult};

/// Executes one liveness check against `url` with the given client.
///
/// Latency is wall-clock from request start to response headers. When no
/// response arrives at all, `status_code` stays `None` so consumers can tell
/// "server said 500" apart from "nothing answered", and the error message
/// distinguishes timeout from connection failure.
///
/// Never fails: every outcome is folded into the returned [`ProbeResult`].
pub async fn check(client: &reqwest::Client, url: &str) -> ProbeResult {
    debug!("HTTP probe: GET {url}");
    let start = Instant::now();

    match client.get(url).send().await {
        Ok(response) => {
            let latency_ms = start.elapsed().as_millis() as i64;
            let status = response.status();
            let code = status.as_u16();

            if (200..500).contains(&code) {
                ProbeResult {
                    outcome: ProbeOutcome::Up,
                    latency_ms: Some(latency_ms),
                    status_code: Some(code),
                    error: None,
                    certificate: None,
                }
            } else {
                ProbeResult {
                    outcome: ProbeOutcome::Down,
                    latency_ms: Some(latency_ms),
                    status_code: Some(code),
                    error: Some(format!("server error: HTTP {status}")),
                    certificate: None,
                }
            }
        }
        Err(e) => {
            let message = if e.is_timeout() {
                format!("request timed out: {e}")
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                format!("request failed: {e}")
            };
            ProbeResult::down(message)
        }
    }
}
