//! uptime_sentinel library: endpoint monitoring core
//!
//! This library implements the monitoring pipeline of a multi-tenant
//! endpoint monitoring service: a per-target scheduler drives HTTP liveness
//! probes and TLS certificate introspection, persists every outcome to
//! SQLite, and raises email/SNMP alerts on state transitions (endpoint
//! down, certificate expiring or expired).
//!
//! The CRUD/dashboard layer is an external collaborator: it writes target
//! rows and calls [`Scheduler::schedule`] / [`Scheduler::stop`] /
//! [`Scheduler::restart`] as it mutates them.
//!
//! # Example
//!
//! ```no_run
//! use uptime_sentinel::{run_service, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! run_service(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod models;
pub mod notify;
pub mod probe;
pub mod scheduler;
pub mod storage;

// Re-export public API
pub use config::{AlertDefaults, Config, LogFormat, LogLevel};
pub use notify::Dispatcher;
pub use run::run_service;
pub use scheduler::Scheduler;
pub use storage::{init_db_pool_with_path, run_migrations};

// Internal run module (service lifecycle glue)
mod run {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use tokio::sync::mpsc;

    use crate::config::{AlertDefaults, Config, ALERT_CHANNEL_CAPACITY};
    use crate::initialization::init_client;
    use crate::notify::Dispatcher;
    use crate::scheduler::Scheduler;
    use crate::storage;

    /// Runs the monitoring service until a shutdown signal arrives.
    ///
    /// Initializes the store and probe client, spawns the notification
    /// dispatcher, schedules every active target, then blocks on Ctrl-C.
    /// Shutdown is graceful: recurrences are cancelled, in-flight ticks
    /// persist their results, and the dispatcher drains its channel before
    /// the function returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database, migrations, or HTTP client fail to
    /// initialize. Probe and notification failures during operation never
    /// surface here; they are logged and absorbed by the pipeline.
    pub async fn run_service(config: Config) -> Result<()> {
        let pool = storage::init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        storage::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let client = init_client(config.probe_timeout_seconds)
            .context("Failed to initialize HTTP probe client")?;
        let defaults = AlertDefaults::from_env();

        let (alert_tx, alert_rx) = mpsc::channel(ALERT_CHANNEL_CAPACITY);
        let dispatcher = Dispatcher::new(Arc::clone(&pool), defaults.clone());
        let dispatcher_task = tokio::spawn(dispatcher.run(alert_rx));

        let scheduler = Scheduler::new(
            pool,
            client,
            alert_tx,
            defaults,
            config.probe_timeout_seconds,
        );
        scheduler.start().await;
        info!(
            "Monitoring service started with {} scheduled target(s)",
            scheduler.scheduled_count()
        );

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        info!("Shutdown signal received, stopping schedules");

        scheduler.stop_all().await;
        // Dropping the scheduler releases the last alert sender; the
        // dispatcher drains what remains and exits.
        drop(scheduler);
        let _ = dispatcher_task.await;

        info!("Monitoring service stopped");
        Ok(())
    }
}
