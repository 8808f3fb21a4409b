//! Relay counters
//!
//! Local atomics back [`RelayMetricsSnapshot`] for the session summary; every
//! update is mirrored to the global `metrics` recorder, labelled by sink and
//! command kind.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one relay
#[derive(Debug)]
pub struct RelayMetrics {
    sink: String,
    queue_len: AtomicUsize,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl RelayMetrics {
    pub fn new(sink: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            queue_len: AtomicUsize::new(0),
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Record the number of commands waiting for the worker
    pub fn observe_queue(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        metrics::gauge!("greenhouse_relay_queue_len", "sink" => self.sink.clone()).set(len as f64);
    }

    pub fn record_written(&self, kind: &'static str) {
        self.written.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "greenhouse_commands_written_total",
            "sink" => self.sink.clone(),
            "kind" => kind
        )
        .increment(1);
    }

    pub fn record_failed(&self, kind: &'static str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "greenhouse_command_write_failures_total",
            "sink" => self.sink.clone(),
            "kind" => kind
        )
        .increment(1);
    }

    /// Command never reached the worker (`reason` is `full` or `closed`)
    pub fn record_dropped(&self, kind: &'static str, reason: &'static str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "greenhouse_commands_dropped_total",
            "sink" => self.sink.clone(),
            "kind" => kind,
            "reason" => reason
        )
        .increment(1);
    }

    pub fn write_count(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Point-in-time copy for reporting
    pub fn snapshot(&self) -> RelayMetricsSnapshot {
        RelayMetricsSnapshot {
            queue_len: self.queue_len.load(Ordering::Relaxed),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Copy of relay counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayMetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}
