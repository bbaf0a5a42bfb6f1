//! SQLite-backed target store.
//!
//! The scheduler consumes reads (`targets`, `alerts`) and writes probe
//! outcomes (`status`, `log`); everything is pool-based so overlapping
//! ticks across targets can persist concurrently.

mod alerts;
mod log;
mod pool;
mod status;
mod targets;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use alerts::{effective_cert_warn_days, get_alert_preference};
pub use log::{append_log, count_log_entries, recent_log_entries};
pub use pool::{init_db_pool_with_path, run_migrations};
pub use status::{update_certificate, update_status};
pub use targets::{get_proxy, get_target, list_active_targets};
