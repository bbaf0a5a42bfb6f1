//! Configuration types and CLI options.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DB_PATH, DEFAULT_CERT_WARN_DAYS, HTTP_PROBE_TIMEOUT_SECS};

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Service configuration.
///
/// Doubles as the CLI surface of the binary; library callers construct it
/// directly and lean on `Default`. Alert transport settings intentionally
/// live in the environment (see [`AlertDefaults::from_env`]), not here:
/// credentials don't belong on a command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "uptime_sentinel", about = "Endpoint monitoring service")]
pub struct Config {
    /// SQLite database path
    #[arg(long, default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// HTTP probe timeout in seconds
    #[arg(long, default_value_t = HTTP_PROBE_TIMEOUT_SECS)]
    pub probe_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            probe_timeout_seconds: HTTP_PROBE_TIMEOUT_SECS,
        }
    }
}

/// Outbound SMTP transport settings.
#[derive(Debug, Clone, Default)]
pub struct MailSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

/// Process-wide alert defaults.
///
/// Users without an `alert_preferences` row (or with individual fields left
/// NULL) fall back to these, field by field.
#[derive(Debug, Clone, Default)]
pub struct AlertDefaults {
    pub mail: MailSettings,
    pub email_to: Option<String>,
    pub snmp_host: Option<String>,
    pub snmp_community: Option<String>,
    pub snmp_oid_api_down: Option<String>,
    pub snmp_oid_cert_expiring: Option<String>,
    pub cert_warn_days: i64,
}

impl AlertDefaults {
    /// Reads alert defaults from the environment (typically a `.env` file
    /// loaded at startup). Absent variables leave the corresponding channel
    /// unconfigured, which the dispatcher treats as a no-op.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            mail: MailSettings {
                host: var("SMTP_HOST"),
                port: var("SMTP_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                from: var("SMTP_FROM"),
            },
            email_to: var("ALERT_EMAIL_TO"),
            snmp_host: var("SNMP_HOST"),
            snmp_community: var("SNMP_COMMUNITY"),
            snmp_oid_api_down: var("SNMP_OID_API_DOWN"),
            snmp_oid_cert_expiring: var("SNMP_OID_CERT_EXPIRING"),
            cert_warn_days: var("CERT_WARN_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CERT_WARN_DAYS),
        }
    }
}
