//! Application initialization and resource setup.
//!
//! Functions to initialize the shared resources the monitoring pipeline
//! needs: the logger, HTTP probe clients, and the rustls crypto provider.

mod client;
mod logger;

use rustls::crypto::{ring::default_provider, CryptoProvider};

// Re-export public API
pub use client::{build_proxy_client, init_client};
pub use logger::init_logger_with;

/// Initializes the crypto provider for TLS operations.
///
/// Configures the global crypto provider for `rustls`. Must be called before
/// any TLS probe runs.
pub fn init_crypto_provider() {
    // Reinstalling an already-installed provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}
