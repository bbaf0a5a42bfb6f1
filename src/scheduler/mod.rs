//! Per-target probe scheduling.
//!
//! The scheduler keeps exactly one live periodic timer per active target,
//! keyed by target id. Each timer runs as an independent tokio task; ticks
//! for different targets overlap freely (each target owns disjoint rows),
//! while ticks for a single target are serialized by construction.

mod tick;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::{AlertDefaults, TICK_UNIT};
use crate::models::{AlertEvent, Target};
use crate::storage;

/// One registered timer: the token cancels the recurrence, the handle lets
/// shutdown wait for an in-flight tick to finish.
struct ScheduleEntry {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub(crate) struct SchedulerInner {
    pub(crate) pool: Arc<SqlitePool>,
    pub(crate) client: Arc<reqwest::Client>,
    pub(crate) alert_tx: mpsc::Sender<AlertEvent>,
    pub(crate) defaults: AlertDefaults,
    pub(crate) probe_timeout_seconds: u64,
    tick_unit: Duration,
    entries: Mutex<HashMap<i64, ScheduleEntry>>,
}

/// Owns the target-id → timer registry and the probe/persist/alert pipeline
/// each timer drives.
///
/// The external CRUD layer holds a clone and calls [`Scheduler::schedule`],
/// [`Scheduler::stop`], and [`Scheduler::restart`] whenever it mutates
/// target rows.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub fn new(
        pool: Arc<SqlitePool>,
        client: Arc<reqwest::Client>,
        alert_tx: mpsc::Sender<AlertEvent>,
        defaults: AlertDefaults,
        probe_timeout_seconds: u64,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                pool,
                client,
                alert_tx,
                defaults,
                probe_timeout_seconds,
                tick_unit: TICK_UNIT,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Overrides the scheduling unit (one minute in production).
    ///
    /// Cadence tests scale it down to run interval semantics in real
    /// sub-second time. Must be called before any target is scheduled; once
    /// the scheduler has been cloned or started, the override is ignored.
    pub fn with_tick_unit(mut self, unit: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.tick_unit = unit;
        }
        self
    }

    /// Loads all active targets and schedules each of them.
    ///
    /// Idempotent across restarts: any existing entries are torn down first.
    /// A failed initial load is logged and leaves the scheduler running with
    /// zero targets rather than failing startup.
    pub async fn start(&self) {
        self.clear_entries();
        match storage::list_active_targets(&self.inner.pool).await {
            Ok(targets) => {
                info!("Scheduling {} active target(s)", targets.len());
                for target in &targets {
                    self.schedule(target);
                }
            }
            Err(e) => {
                error!("Failed to load targets at startup, monitoring starts empty: {e}");
            }
        }
    }

    /// Creates (or replaces) the periodic timer for a target.
    ///
    /// An existing entry for the same id is torn down first, so repeated
    /// calls leave exactly one live timer. Inactive targets get no timer.
    /// The first tick fires immediately, so a freshly created or updated
    /// target gets a status without waiting a full interval.
    pub fn schedule(&self, target: &Target) {
        let mut entries = self
            .inner
            .entries
            .lock()
            .expect("scheduler registry poisoned");

        if let Some(previous) = entries.remove(&target.id) {
            debug!("Replacing existing schedule for target {}", target.id);
            previous.cancel.cancel();
        }

        if !target.active {
            debug!("Target {} is inactive, not scheduling", target.id);
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_target_loop(
            Arc::clone(&self.inner),
            target.clone(),
            cancel.clone(),
        ));
        entries.insert(target.id, ScheduleEntry { cancel, handle });
        info!(
            "Scheduled target {} ({}) every {} minute(s)",
            target.id, target.url, target.interval_minutes
        );
    }

    /// Cancels the recurrence for a target.
    ///
    /// No-op if nothing is scheduled under that id. Cancellation is not
    /// preemptive: an in-flight tick runs to completion and persists its
    /// result; only future ticks are suppressed.
    pub fn stop(&self, target_id: i64) {
        let removed = self
            .inner
            .entries
            .lock()
            .expect("scheduler registry poisoned")
            .remove(&target_id);
        match removed {
            Some(entry) => {
                entry.cancel.cancel();
                info!("Stopped schedule for target {target_id}");
            }
            None => debug!("No schedule to stop for target {target_id}"),
        }
    }

    /// Rebuilds a target's timer after its definition changed.
    ///
    /// Interval changes need a new timer and an active→inactive flip must
    /// remove it; both fall out of stop-then-schedule. The probe kind is
    /// re-derived from the row passed in.
    pub fn restart(&self, target: &Target) {
        self.stop(target.id);
        self.schedule(target);
    }

    /// Tears down every timer and waits for in-flight ticks to finish.
    /// Used at graceful shutdown.
    pub async fn stop_all(&self) {
        let drained: Vec<ScheduleEntry> = {
            let mut entries = self
                .inner
                .entries
                .lock()
                .expect("scheduler registry poisoned");
            entries.drain().map(|(_, entry)| entry).collect()
        };
        info!("Stopping {} scheduled target(s)", drained.len());
        for entry in &drained {
            entry.cancel.cancel();
        }
        for entry in drained {
            let _ = entry.handle.await;
        }
    }

    /// Number of live schedule entries. Exposed for the CRUD layer's health
    /// reporting.
    pub fn scheduled_count(&self) -> usize {
        self.inner
            .entries
            .lock()
            .expect("scheduler registry poisoned")
            .len()
    }

    fn clear_entries(&self) {
        let mut entries = self
            .inner
            .entries
            .lock()
            .expect("scheduler registry poisoned");
        for (_, entry) in entries.drain() {
            entry.cancel.cancel();
        }
    }
}

/// The per-target timer loop.
///
/// `MissedTickBehavior::Delay` gives the no-overlap contract: the tick body
/// is awaited inline, so a slow probe delays the next tick instead of
/// running concurrently with it. The first `interval.tick()` completes
/// immediately (fire-on-register). Cancellation is observed only between
/// ticks.
async fn run_target_loop(inner: Arc<SchedulerInner>, target: Target, cancel: CancellationToken) {
    let period = inner.tick_unit * target.interval_minutes.max(1) as u32;
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                tick::run_tick(&inner, &target).await;
            }
        }
    }
    debug!("Schedule loop for target {} ended", target.id);
}
