//! Admission counters for observability
//!
//! Plain atomic counters, bumped by the quota actor and read by the
//! `/metrics` endpoint in Prometheus text format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters collected by the server
pub struct Metrics {
    /// Server start time
    start_time: Instant,

    /// Checks received, including unknown subjects
    pub total_checks: AtomicU64,

    /// Admission decisions
    pub requests_allowed: AtomicU64,
    pub requests_refused: AtomicU64,

    /// Checks for a subject with no quota rule
    pub unknown_subjects: AtomicU64,

    /// Quotas restored through the reset endpoint
    pub quota_resets: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_checks: AtomicU64::new(0),
            requests_allowed: AtomicU64::new(0),
            requests_refused: AtomicU64::new(0),
            unknown_subjects: AtomicU64::new(0),
            quota_resets: AtomicU64::new(0),
        }
    }

    /// Record the outcome of one check; `None` for an unknown subject
    pub fn record_check(&self, outcome: Option<bool>) {
        self.total_checks.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            Some(true) => &self.requests_allowed,
            Some(false) => &self.requests_refused,
            None => &self.unknown_subjects,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.quota_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::with_capacity(1024);

        let series = [
            (
                "quotaslice_uptime_seconds",
                "gauge",
                "Time since server start in seconds",
                self.uptime_seconds(),
            ),
            (
                "quotaslice_checks_total",
                "counter",
                "Total number of quota checks received",
                self.total_checks.load(Ordering::Relaxed),
            ),
            (
                "quotaslice_requests_allowed",
                "counter",
                "Total requests admitted",
                self.requests_allowed.load(Ordering::Relaxed),
            ),
            (
                "quotaslice_requests_refused",
                "counter",
                "Total requests refused because the quota was exhausted",
                self.requests_refused.load(Ordering::Relaxed),
            ),
            (
                "quotaslice_unknown_subjects",
                "counter",
                "Total checks for subjects without a quota rule",
                self.unknown_subjects.load(Ordering::Relaxed),
            ),
            (
                "quotaslice_quota_resets",
                "counter",
                "Total quotas reset on request",
                self.quota_resets.load(Ordering::Relaxed),
            ),
        ];

        for (name, kind, help, value) in series {
            // Writing to a String cannot fail
            let _ = write!(
                output,
                "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n\n"
            );
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
