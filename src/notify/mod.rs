//! Notification dispatch: email and SNMP trap alerting.
//!
//! The dispatcher consumes [`AlertEvent`]s emitted by scheduler ticks,
//! resolves the owning user's routing (preference row with field-by-field
//! fallback to process defaults), and attempts each configured channel
//! independently. Nothing here ever propagates back to the scheduler: every
//! failure is logged and dropped.

pub mod email;
pub mod snmp;

use std::sync::Arc;

use log::{info, warn};
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::config::{AlertDefaults, DEFAULT_SNMP_COMMUNITY};
use crate::models::{AlertEvent, AlertKind, AlertPreference};
use crate::storage;

/// Alert routing after user-preference/default resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveRouting {
    pub email_to: Option<String>,
    pub snmp_host: Option<String>,
    pub snmp_community: String,
    pub snmp_oid_api_down: Option<String>,
    pub snmp_oid_cert_expiring: Option<String>,
}

impl EffectiveRouting {
    /// Resolves routing field by field: the user's stored preference wins,
    /// absent fields fall back to the process defaults.
    pub fn resolve(preference: Option<AlertPreference>, defaults: &AlertDefaults) -> Self {
        let preference = preference.unwrap_or_default();
        Self {
            email_to: preference.email_to.or_else(|| defaults.email_to.clone()),
            snmp_host: preference.snmp_host.or_else(|| defaults.snmp_host.clone()),
            snmp_community: preference
                .snmp_community
                .or_else(|| defaults.snmp_community.clone())
                .unwrap_or_else(|| DEFAULT_SNMP_COMMUNITY.to_string()),
            snmp_oid_api_down: preference
                .snmp_oid_api_down
                .or_else(|| defaults.snmp_oid_api_down.clone()),
            snmp_oid_cert_expiring: preference
                .snmp_oid_cert_expiring
                .or_else(|| defaults.snmp_oid_cert_expiring.clone()),
        }
    }

    /// The trap OID configured for this alert kind, if any.
    fn oid_for(&self, kind: &AlertKind) -> Option<&str> {
        match kind {
            AlertKind::ApiDown { .. } => self.snmp_oid_api_down.as_deref(),
            AlertKind::CertificateExpiring { .. } => self.snmp_oid_cert_expiring.as_deref(),
        }
    }
}

/// Consumes alert events and fans them out to email and SNMP.
pub struct Dispatcher {
    pool: Arc<SqlitePool>,
    defaults: AlertDefaults,
}

impl Dispatcher {
    pub fn new(pool: Arc<SqlitePool>, defaults: AlertDefaults) -> Self {
        Self { pool, defaults }
    }

    /// Drains the alert channel until every sender is gone. Run this on its
    /// own task; it ends when the scheduler shuts down.
    pub async fn run(self, mut rx: mpsc::Receiver<AlertEvent>) {
        while let Some(event) = rx.recv().await {
            self.dispatch(&event).await;
        }
        info!("Alert channel closed, dispatcher exiting");
    }

    /// Handles one alert event: resolve routing, then attempt both channels
    /// independently. Failure of one channel never blocks the other.
    pub async fn dispatch(&self, event: &AlertEvent) {
        let preference = match storage::get_alert_preference(&self.pool, event.user_id).await {
            Ok(preference) => preference,
            Err(e) => {
                warn!(
                    "Failed to load alert preference for user {}, using defaults: {e}",
                    event.user_id
                );
                None
            }
        };
        let routing = EffectiveRouting::resolve(preference, &self.defaults);

        self.email_channel(&routing, event).await;
        self.snmp_channel(&routing, event).await;
    }

    async fn email_channel(&self, routing: &EffectiveRouting, event: &AlertEvent) {
        let Some(recipient) = routing.email_to.as_deref() else {
            warn!(
                "No alert email recipient for user {}; skipping email",
                event.user_id
            );
            return;
        };
        if let Err(e) = email::send_email(&self.defaults.mail, recipient, &event.kind).await {
            warn!("Failed to send alert email to {recipient}: {e}");
        }
    }

    async fn snmp_channel(&self, routing: &EffectiveRouting, event: &AlertEvent) {
        let Some(host) = routing.snmp_host.as_deref() else {
            return;
        };
        let Some(oid) = routing.oid_for(&event.kind) else {
            warn!(
                "SNMP receiver {host} configured but no OID for this alert kind; skipping trap"
            );
            return;
        };
        if !snmp::is_valid_oid(oid) {
            warn!("Rejecting malformed SNMP OID {oid:?}; trap not sent");
            return;
        }
        if let Err(e) =
            snmp::send_trap(host, &routing.snmp_community, oid, &event.kind.describe()).await
        {
            warn!("Failed to send SNMP trap to {host}: {e}");
        }
    }
}
