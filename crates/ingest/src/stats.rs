use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

/// Counters for one log type
#[derive(Debug, Default)]
pub struct LogTypeCounters {
    pub lines: AtomicU64,
    pub events: AtomicU64,
    pub dropped: AtomicU64,
}

/// Point-in-time copy of one log type's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogTypeSnapshot {
    pub log_type: String,
    pub lines: u64,
    pub events: u64,
    pub dropped: u64,
}

/// Ingest counters shared by every worker.
///
/// Keyed by log type; lines no parser accepted and lines that are not
/// valid UTF-8 are counted separately.
#[derive(Debug, Default)]
pub struct IngestStats {
    per_type: DashMap<String, LogTypeCounters>,
    unmatched: AtomicU64,
    non_utf8: AtomicU64,
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one parsed line and the number of events it produced
    pub fn record(&self, log_type: &str, events: usize) {
        let counters = self.per_type.entry(log_type.to_string()).or_default();
        counters.lines.fetch_add(1, Ordering::Relaxed);
        if events == 0 {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.events.fetch_add(events as u64, Ordering::Relaxed);
        }
    }

    /// A line no candidate parser accepted
    pub fn record_unmatched(&self) {
        self.unmatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unmatched(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }

    /// A line dropped before parsing because it is not valid UTF-8
    pub fn record_non_utf8(&self) {
        self.non_utf8.fetch_add(1, Ordering::Relaxed);
    }

    pub fn non_utf8(&self) -> u64 {
        self.non_utf8.load(Ordering::Relaxed)
    }

    pub fn total_events(&self) -> u64 {
        self.per_type
            .iter()
            .map(|entry| entry.value().events.load(Ordering::Relaxed))
            .sum()
    }

    /// Snapshot sorted by log type
    pub fn snapshot(&self) -> Vec<LogTypeSnapshot> {
        let mut snapshot: Vec<LogTypeSnapshot> = self
            .per_type
            .iter()
            .map(|entry| LogTypeSnapshot {
                log_type: entry.key().clone(),
                lines: entry.value().lines.load(Ordering::Relaxed),
                events: entry.value().events.load(Ordering::Relaxed),
                dropped: entry.value().dropped.load(Ordering::Relaxed),
            })
            .collect();
        snapshot.sort_by(|a, b| a.log_type.cmp(&b.log_type));
        snapshot
    }

    /// Emit one summary log line per log type
    pub fn log_summary(&self) {
        for entry in self.snapshot() {
            tracing::info!(
                log_type = %entry.log_type,
                lines = entry.lines,
                events = entry.events,
                dropped = entry.dropped,
                "ingest summary"
            );
        }
        let unmatched = self.unmatched();
        if unmatched > 0 {
            tracing::warn!(unmatched, "lines matched no parser");
        }
        let non_utf8 = self.non_utf8();
        if non_utf8 > 0 {
            tracing::warn!(non_utf8, "lines dropped as invalid UTF-8");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_counts_events_and_drops() {
        let stats = IngestStats::new();
        stats.record("AWS.CloudTrail", 3);
        stats.record("AWS.CloudTrail", 0);
        stats.record("Syslog.RFC5424", 1);

        let snapshot = stats.snapshot();
        assert_eq!(
            snapshot[0],
            LogTypeSnapshot {
                log_type: "AWS.CloudTrail".to_string(),
                lines: 2,
                events: 3,
                dropped: 1,
            }
        );
        assert_eq!(snapshot[1].log_type, "Syslog.RFC5424");
        assert_eq!(stats.total_events(), 4);
    }

    #[test]
    fn test_unmatched() {
        let stats = IngestStats::new();
        stats.record_unmatched();
        stats.record_unmatched();
        assert_eq!(stats.unmatched(), 2);
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn test_non_utf8_counted_apart_from_log_types() {
        let stats = IngestStats::new();
        stats.record_non_utf8();
        assert_eq!(stats.non_utf8(), 1);
        assert_eq!(stats.unmatched(), 0);
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_updates() {
        let stats = Arc::new(IngestStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record("Fluentd.Syslog3164", 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.total_events(), 400);
        assert_eq!(stats.snapshot()[0].lines, 400);
    }
}
