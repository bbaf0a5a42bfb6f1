//! Probe implementations, one per target kind.
//!
//! Probes are pure result producers: they take a URL (and transport
//! configuration), perform one check, and return a
//! [`crate::models::ProbeResult`]. They never touch the store and never
//! return errors; the scheduler tick owns persistence and alerting.

pub mod http;
pub mod tls;
