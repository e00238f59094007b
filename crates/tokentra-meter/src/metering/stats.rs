//! Telemetry counters
//!
//! Lock-free counters shared by call sites and the worker. All counters only
//! grow, except `telemetry_buffered`, which rises on enqueue and falls when a
//! batch is delivered or the queue refuses the event.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stats aggregator owned by the telemetry pipeline
#[derive(Debug, Default)]
pub struct TelemetryStats {
    requests_tracked: AtomicU64,
    telemetry_sent: AtomicU64,
    telemetry_failed: AtomicU64,
    telemetry_buffered: AtomicU64,
    telemetry_dropped: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub requests_tracked: u64,
    pub telemetry_sent: u64,
    pub telemetry_failed: u64,
    pub telemetry_buffered: u64,
    pub telemetry_dropped: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub errors: u64,
}

impl TelemetryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tracked(&self) {
        self.requests_tracked.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed provider call
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache(&self, hit: bool) {
        let counter = if hit {
            &self.cache_hits
        } else {
            &self.cache_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffered(&self) {
        self.telemetry_buffered.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an event the queue refused, releasing its buffered slot
    pub fn record_dropped(&self) {
        self.telemetry_dropped.fetch_add(1, Ordering::Relaxed);
        self.release_buffered(1);
    }

    /// Count a delivered batch
    pub fn record_sent(&self, count: u64) {
        self.telemetry_sent.fetch_add(count, Ordering::Relaxed);
        self.release_buffered(count);
    }

    fn release_buffered(&self, count: u64) {
        let _ = self
            .telemetry_buffered
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |buffered| {
                Some(buffered.saturating_sub(count))
            });
    }

    /// Count a batch that could not be delivered
    pub fn record_failed(&self, count: u64) {
        self.telemetry_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_tracked: self.requests_tracked.load(Ordering::Relaxed),
            telemetry_sent: self.telemetry_sent.load(Ordering::Relaxed),
            telemetry_failed: self.telemetry_failed.load(Ordering::Relaxed),
            telemetry_buffered: self.telemetry_buffered.load(Ordering::Relaxed),
            telemetry_dropped: self.telemetry_dropped.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(TelemetryStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_buffered_falls_on_send_only() {
        let stats = TelemetryStats::new();
        for _ in 0..5 {
            stats.record_buffered();
        }
        stats.record_sent(3);
        stats.record_failed(2);

        let snap = stats.snapshot();
        assert_eq!(snap.telemetry_sent, 3);
        assert_eq!(snap.telemetry_failed, 2);
        assert_eq!(snap.telemetry_buffered, 2);
    }

    #[test]
    fn test_buffered_never_underflows() {
        let stats = TelemetryStats::new();
        stats.record_sent(4);
        assert_eq!(stats.snapshot().telemetry_buffered, 0);
    }

    #[test]
    fn test_drop_releases_buffered_slot() {
        let stats = TelemetryStats::new();
        stats.record_buffered();
        stats.record_buffered();
        stats.record_dropped();

        let snap = stats.snapshot();
        assert_eq!(snap.telemetry_buffered, 1);
        assert_eq!(snap.telemetry_dropped, 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let stats = TelemetryStats::new();
        stats.record_tracked();
        let before = stats.snapshot();
        stats.record_tracked();
        stats.record_cache(true);
        stats.record_cache(false);
        stats.record_error();
        stats.record_dropped();

        assert_eq!(before.requests_tracked, 1);
        let after = stats.snapshot();
        assert_eq!(after.requests_tracked, 2);
        assert_eq!((after.cache_hits, after.cache_misses), (1, 1));
        assert_eq!(after.errors, 1);
        assert_eq!(after.telemetry_dropped, 1);
    }
}
