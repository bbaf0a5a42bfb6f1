//! HTTP client initialization.
//!
//! Probes share one direct client; targets with a proxy descriptor get a
//! client of their own, built per probe, because `reqwest` fixes the proxy
//! at client construction time.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::TCP_CONNECT_TIMEOUT_SECS;
use crate::error_handling::InitializationError;
use crate::models::ProxyDescriptor;

/// Initializes the shared direct (proxy-less) probe client.
///
/// Configured with:
/// - the probe timeout (request start through response headers)
/// - a separate TCP connect timeout so unroutable hosts fail fast
/// - redirect following (a relocated health endpoint still answers)
/// - Rustls TLS backend
///
/// # Errors
///
/// Returns an `InitializationError` if client creation fails.
pub fn init_client(timeout_seconds: u64) -> Result<Arc<reqwest::Client>, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .use_rustls_tls()
        .build()?;
    Ok(Arc::new(client))
}

/// Builds a probe client routed through the given proxy.
///
/// Credentials, when present on the descriptor, are applied as basic auth.
/// The descriptor's protocol selects the proxy scheme (`http`, `https`, or
/// `socks5`).
///
/// # Errors
///
/// Returns an `InitializationError` if the proxy URL is rejected or client
/// creation fails.
pub fn build_proxy_client(
    timeout_seconds: u64,
    proxy: &ProxyDescriptor,
) -> Result<reqwest::Client, InitializationError> {
    let mut proxy_config = reqwest::Proxy::all(proxy.url())
        .map_err(|e| InitializationError::ProxyError(format!("{}: {e}", proxy.url())))?;

    if let (Some(username), Some(password)) = (&proxy.username, &proxy.password) {
        proxy_config = proxy_config.basic_auth(username, password);
    }

    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .use_rustls_tls()
        .proxy(proxy_config)
        .build()?;
    Ok(client)
}
