//! Error type definitions.
//!
//! One `thiserror` enum per concern. Probe-level failures are deliberately
//! absent: probes fold every failure into a [`crate::models::ProbeResult`]
//! so the scheduler always has an outcome to persist.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error building a proxy descriptor into a client.
    #[error("Proxy configuration error: {0}")]
    ProxyError(String),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating or opening the database file.
    #[error("Database file error: {0}")]
    FileError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Error types for notification dispatch.
///
/// These never reach the scheduler; the dispatcher logs them and moves on.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Recipient or sender address failed to parse.
    #[error("Invalid mail address: {0}")]
    AddressError(#[from] lettre::address::AddressError),

    /// Message construction failed.
    #[error("Mail build error: {0}")]
    MailBuildError(#[from] lettre::error::Error),

    /// SMTP transport failure.
    #[error("SMTP error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),

    /// An OID failed the strict dotted-numeric format check.
    #[error("Malformed OID {0:?}: expected dotted numeric form like .1.3.6.1.4.1")]
    MalformedOid(String),

    /// UDP socket failure while emitting a trap.
    #[error("SNMP trap send error: {0}")]
    TrapSendError(#[from] std::io::Error),
}
