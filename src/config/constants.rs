//! Configuration constants.
//!
//! Operational parameters for probes, scheduling, and alerting. Values that
//! deployments commonly tune are also exposed through `Config`/environment
//! variables; these are the defaults.

use std::time::Duration;

/// Default SQLite database path.
pub const DB_PATH: &str = "./uptime_sentinel.db";

/// HTTP probe request timeout in seconds.
///
/// Covers the whole GET: connect, TLS, and response headers. A target that
/// takes longer than this is recorded as down with a timeout error.
pub const HTTP_PROBE_TIMEOUT_SECS: u64 = 10;

/// TCP connection timeout for the TLS probe, in seconds.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// TLS handshake timeout for the TLS probe, in seconds.
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

/// Port probed for certificates when the target URL does not carry one.
pub const TLS_DEFAULT_PORT: u16 = 443;

/// Certificate warning threshold in days, used when neither the user's
/// alert preference nor the environment configures one.
pub const DEFAULT_CERT_WARN_DAYS: i64 = 30;

/// Production scheduling unit: target intervals are expressed in minutes.
pub const TICK_UNIT: Duration = Duration::from_secs(60);

/// Capacity of the scheduler -> dispatcher alert channel.
///
/// Alert bursts beyond this are dropped with a warning rather than backing
/// up into probe ticks.
pub const ALERT_CHANNEL_CAPACITY: usize = 64;

/// UDP port SNMP traps are sent to.
pub const SNMP_TRAP_PORT: u16 = 162;

/// Community string used when neither preference nor environment sets one.
pub const DEFAULT_SNMP_COMMUNITY: &str = "public";

/// Upper bound on error messages persisted to the store.
///
/// Transport errors can embed whole response fragments; anything longer is
/// truncated with a marker.
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;
