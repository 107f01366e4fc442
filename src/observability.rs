//! Tracing bootstrap and registry counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Calling this twice is
/// harmless; the second call leaves the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording registry counters
#[derive(Debug, Default)]
pub struct Metrics {
    registrations: AtomicU64,
    conflicts: AtomicU64,
    unregistrations: AtomicU64,
    lookups: AtomicU64,
    storage_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "registrations", "Metric incremented");
    }

    pub fn conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "conflicts", "Metric incremented");
    }

    pub fn unregistered(&self) {
        self.unregistrations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "unregistrations", "Metric incremented");
    }

    pub fn lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn storage_failed(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "storage_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            unregistrations: self.unregistrations.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub conflicts: u64,
    pub unregistrations: u64,
    pub lookups: u64,
    pub storage_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = Metrics::new();
        metrics.registered();
        metrics.registered();
        metrics.conflict();
        metrics.lookup();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.registrations, 2);
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.lookups, 1);
        assert_eq!(snapshot.unregistrations, 0);
        assert_eq!(snapshot.storage_failures, 0);
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing("warn");
        init_tracing("debug");
    }
}
