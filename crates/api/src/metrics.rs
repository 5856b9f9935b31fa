use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use retrieval::RetrievalTrace;

pub struct Metrics {
    // Counters
    total_turns: AtomicUsize,
    failed_turns: AtomicUsize,
    retrieval_unavailable: AtomicUsize,

    // Timing (in microseconds)
    total_turn_time_us: AtomicU64,

    // Retrieval counts
    total_entities_extracted: AtomicUsize,
    total_followups_dispatched: AtomicUsize,
    total_followups_degraded: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_turns: AtomicUsize::new(0),
            failed_turns: AtomicUsize::new(0),
            retrieval_unavailable: AtomicUsize::new(0),
            total_turn_time_us: AtomicU64::new(0),
            total_entities_extracted: AtomicUsize::new(0),
            total_followups_dispatched: AtomicUsize::new(0),
            total_followups_degraded: AtomicUsize::new(0),
        })
    }

    pub fn record_turn(&self, success: bool, duration: std::time::Duration) {
        self.total_turns.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_turns.fetch_add(1, Ordering::Relaxed);
        }
        self.total_turn_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_retrieval_unavailable(&self) {
        self.retrieval_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retrieval(&self, trace: &RetrievalTrace) {
        self.total_entities_extracted
            .fetch_add(trace.entities_found, Ordering::Relaxed);
        self.total_followups_dispatched
            .fetch_add(trace.followups_dispatched, Ordering::Relaxed);
        self.total_followups_degraded
            .fetch_add(trace.followups_degraded, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.total_turns.load(Ordering::Relaxed);
        let total_us = self.total_turn_time_us.load(Ordering::Relaxed) as f64;
        let avg_turn_time_ms = if turns > 0 {
            total_us / turns as f64 / 1000.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_turns: turns,
            failed_turns: self.failed_turns.load(Ordering::Relaxed),
            retrieval_unavailable: self.retrieval_unavailable.load(Ordering::Relaxed),
            avg_turn_time_ms,
            total_entities_extracted: self.total_entities_extracted.load(Ordering::Relaxed),
            total_followups_dispatched: self.total_followups_dispatched.load(Ordering::Relaxed),
            total_followups_degraded: self.total_followups_degraded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub total_turns: usize,
    pub failed_turns: usize,
    pub retrieval_unavailable: usize,
    pub avg_turn_time_ms: f64,
    pub total_entities_extracted: usize,
    pub total_followups_dispatched: usize,
    pub total_followups_degraded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_snapshot_reflects_recorded_turns() {
        let metrics = Metrics::new();
        metrics.record_turn(true, Duration::from_millis(200));
        metrics.record_turn(false, Duration::from_millis(400));
        metrics.record_retrieval(&RetrievalTrace {
            entities_found: 3,
            followups_dispatched: 3,
            followups_degraded: 1,
            ..Default::default()
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_turns, 2);
        assert_eq!(snapshot.failed_turns, 1);
        assert!((snapshot.avg_turn_time_ms - 300.0).abs() < 1.0);
        assert_eq!(snapshot.total_entities_extracted, 3);
        assert_eq!(snapshot.total_followups_degraded, 1);
    }
}
