//! Snapshot store
//!
//! Holds exactly one latest snapshot. Writers replace the whole `Arc`, readers
//! clone it; a snapshot is never edited in place, so a reader always sees one
//! complete record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use contracts::{PartialLinePolicy, Snapshot, StreamConfig};
use tracing::{debug, instrument, trace, warn};

use crate::error::{IngestionError, Result};
use crate::framer::{FramedLine, LineFramer};

/// Parse one line into a snapshot
pub fn parse_line(line: &str) -> Result<Snapshot> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::parse("empty line", line));
    }
    serde_json::from_str(trimmed).map_err(|e| IngestionError::parse(e.to_string(), trimmed))
}

/// Outcome of feeding one chunk (or end of stream) to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Complete lines processed
    pub lines: usize,
    /// Lines that parsed as snapshots
    pub accepted: usize,
    /// Lines discarded
    pub rejected: usize,
    /// Whether the stored snapshot was replaced
    pub committed: bool,
}

/// Store health, for display and diagnostics
#[derive(Debug, Clone, Default)]
pub struct StoreStatus {
    /// Snapshots accepted since start
    pub snapshots_accepted: u64,
    /// Lines rejected since start
    pub lines_rejected: u64,
    /// When the current snapshot was committed (None = still the default)
    pub received_at: Option<DateTime<Utc>>,
    /// Most recent rejection
    pub last_error: Option<String>,
    /// Set once the producer is gone; the last snapshot is frozen
    pub stale_reason: Option<String>,
}

impl StoreStatus {
    /// True when serving a frozen snapshot
    pub fn is_stale(&self) -> bool {
        self.stale_reason.is_some()
    }
}

#[derive(Debug, Default)]
struct StoreMeta {
    received_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    stale_reason: Option<String>,
}

/// Latest-value snapshot store
#[derive(Debug)]
pub struct SnapshotStore {
    latest: RwLock<Arc<Snapshot>>,
    framer: Mutex<LineFramer>,
    max_line_bytes: usize,
    partial_line_policy: PartialLinePolicy,
    meta: Mutex<StoreMeta>,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}

impl SnapshotStore {
    /// Create an empty store; `read` returns the default snapshot until data arrives
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            latest: RwLock::new(Arc::new(Snapshot::default())),
            framer: Mutex::new(LineFramer::new(config.max_line_bytes)),
            max_line_bytes: config.max_line_bytes,
            partial_line_policy: config.partial_line_policy,
            meta: Mutex::new(StoreMeta::default()),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Ingest one complete line
    ///
    /// On success the stored snapshot is replaced; on failure it is left
    /// untouched and the error is returned.
    pub fn ingest(&self, line: &str) -> Result<()> {
        match parse_line(line) {
            Ok(snapshot) => {
                self.record_accepted();
                self.commit(snapshot);
                Ok(())
            }
            Err(e) => {
                self.record_rejected(&e);
                Err(e)
            }
        }
    }

    /// Ingest a raw chunk from the stream
    ///
    /// Every complete line is parsed in arrival order; only the last valid one
    /// is committed. Any unterminated tail waits for the next chunk.
    pub fn ingest_chunk(&self, chunk: &[u8]) -> IngestReport {
        let frames = self
            .framer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chunk);
        self.ingest_frames(frames)
    }

    /// End of stream: apply the partial-line policy to any buffered tail
    pub fn finish_stream(&self) -> IngestReport {
        let tail = self
            .framer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finish(self.partial_line_policy);
        self.ingest_frames(tail.into_iter().collect())
    }

    /// Latest committed snapshot, or the default one; never blocks on data
    pub fn read(&self) -> Arc<Snapshot> {
        Arc::clone(&self.latest.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether any snapshot has been committed
    pub fn has_data(&self) -> bool {
        self.accepted.load(Ordering::Relaxed) > 0
    }

    /// Freeze the store: keep serving the last snapshot, flagged stale
    #[instrument(name = "store_mark_stale", skip(self, reason))]
    pub fn mark_stale(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(reason = %reason, "Snapshot store is now stale");
        self.lock_meta().stale_reason = Some(reason);
    }

    /// Current store health
    pub fn status(&self) -> StoreStatus {
        let meta = self.lock_meta();
        StoreStatus {
            snapshots_accepted: self.accepted.load(Ordering::Relaxed),
            lines_rejected: self.rejected.load(Ordering::Relaxed),
            received_at: meta.received_at,
            last_error: meta.last_error.clone(),
            stale_reason: meta.stale_reason.clone(),
        }
    }

    fn ingest_frames(&self, frames: Vec<FramedLine>) -> IngestReport {
        let mut report = IngestReport::default();
        let mut newest = None;

        for frame in frames {
            report.lines += 1;
            match self.parse_frame(frame) {
                Ok(snapshot) => {
                    report.accepted += 1;
                    self.record_accepted();
                    newest = Some(snapshot);
                }
                Err(e) => {
                    report.rejected += 1;
                    self.record_rejected(&e);
                }
            }
        }

        if let Some(snapshot) = newest {
            self.commit(snapshot);
            report.committed = true;
        }

        trace!(
            lines = report.lines,
            accepted = report.accepted,
            rejected = report.rejected,
            "Chunk ingested"
        );
        report
    }

    fn parse_frame(&self, frame: FramedLine) -> Result<Snapshot> {
        match frame {
            FramedLine::Line(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => parse_line(text),
                Err(e) => Err(IngestionError::parse(
                    format!("invalid utf-8: {e}"),
                    &String::from_utf8_lossy(&bytes),
                )),
            },
            FramedLine::Oversized { len } => Err(IngestionError::LineTooLong {
                len,
                max: self.max_line_bytes,
            }),
        }
    }

    fn commit(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.lock_meta().received_at = Some(Utc::now());
    }

    fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("greenhouse_snapshots_accepted_total").increment(1);
    }

    fn record_rejected(&self, error: &IngestionError) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("greenhouse_lines_rejected_total").increment(1);
        match error {
            IngestionError::Parse { excerpt, .. } => {
                warn!(error = %error, line = %excerpt, "Discarding producer line");
            }
            IngestionError::LineTooLong { .. } => {
                warn!(error = %error, "Discarding producer line");
            }
        }
        self.lock_meta().last_error = Some(error.to_string());
        debug!(
            rejected = self.rejected.load(Ordering::Relaxed),
            "Keeping last good snapshot"
        );
    }

    fn lock_meta(&self) -> std::sync::MutexGuard<'_, StoreMeta> {
        self.meta.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S1: &str = r#"{"sensors":{"temperature":22.5,"moisture":40,"light":300,"co2":450,"timestamp":"T1"},"actuators":{},"alerts":{}}"#;
    const S2: &str = r#"{"sensors":{"temperature":23.0,"moisture":41,"light":310,"co2":460,"timestamp":"T2"},"actuators":{"heater_pct":5},"alerts":{}}"#;

    #[test]
    fn test_read_before_ingest_returns_default() {
        let store = SnapshotStore::default();
        assert_eq!(*store.read(), Snapshot::default());
        assert!(!store.has_data());
        assert!(store.status().received_at.is_none());
    }

    #[test]
    fn test_ingest_then_read() {
        let store = SnapshotStore::default();
        store.ingest(S1).unwrap();
        assert_eq!(store.read().sensors.temperature, 22.5);
        assert!(store.has_data());
    }

    #[test]
    fn test_last_write_wins() {
        let store = SnapshotStore::default();
        store.ingest(S1).unwrap();
        store.ingest(S2).unwrap();
        let snapshot = store.read();
        assert_eq!(snapshot.sensors.timestamp, "T2");
        assert_eq!(snapshot.sensors.temperature, 23.0);
        assert_eq!(snapshot.actuators.len(), 1);
    }

    #[test]
    fn test_malformed_line_leaves_store_unchanged() {
        let store = SnapshotStore::default();
        store.ingest(S1).unwrap();
        let before = store.read();

        assert!(matches!(
            store.ingest("{not json"),
            Err(IngestionError::Parse { .. })
        ));
        assert!(store.ingest(r#"{"sensors":{"temperature":1}}"#).is_err());
        assert!(store.ingest("").is_err());

        assert_eq!(store.read(), before);
        let status = store.status();
        assert_eq!(status.snapshots_accepted, 1);
        assert_eq!(status.lines_rejected, 3);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_reader_keeps_its_arc_across_replacement() {
        let store = SnapshotStore::default();
        store.ingest(S1).unwrap();
        let held = store.read();
        store.ingest(S2).unwrap();
        assert_eq!(held.sensors.timestamp, "T1");
        assert_eq!(store.read().sensors.timestamp, "T2");
    }

    #[test]
    fn test_batched_chunk_matches_separate_deliveries() {
        let batched = SnapshotStore::default();
        let report = batched.ingest_chunk(format!("{S1}\n{S2}\n").as_bytes());
        assert_eq!(report.lines, 2);
        assert_eq!(report.accepted, 2);
        assert!(report.committed);

        let separate = SnapshotStore::default();
        separate.ingest_chunk(format!("{S1}\n").as_bytes());
        separate.ingest_chunk(format!("{S2}\n").as_bytes());

        assert_eq!(batched.read(), separate.read());
    }

    #[test]
    fn test_batch_keeps_last_valid_line() {
        let store = SnapshotStore::default();
        let report = store.ingest_chunk(format!("{S1}\ngarbage\n").as_bytes());
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(store.read().sensors.timestamp, "T1");
    }

    #[test]
    fn test_split_line_across_chunks() {
        let store = SnapshotStore::default();
        let (head, tail) = S1.split_at(30);
        let first = store.ingest_chunk(head.as_bytes());
        assert_eq!(first.lines, 0);
        assert!(!store.has_data());

        let second = store.ingest_chunk(format!("{tail}\n").as_bytes());
        assert_eq!(second.accepted, 1);
        assert_eq!(store.read().sensors.temperature, 22.5);
    }

    #[test]
    fn test_unterminated_tail_discarded_by_default() {
        let store = SnapshotStore::default();
        store.ingest_chunk(S1.as_bytes());
        let report = store.finish_stream();
        assert_eq!(report.lines, 0);
        assert!(!store.has_data());
    }

    #[test]
    fn test_unterminated_tail_flushed_when_configured() {
        let config = StreamConfig {
            partial_line_policy: PartialLinePolicy::FlushOnEof,
            ..StreamConfig::default()
        };
        let store = SnapshotStore::new(&config);
        store.ingest_chunk(S1.as_bytes());
        let report = store.finish_stream();
        assert!(report.committed);
        assert_eq!(store.read().sensors.timestamp, "T1");
    }

    #[test]
    fn test_oversized_line_rejected() {
        let config = StreamConfig {
            max_line_bytes: 16,
            ..StreamConfig::default()
        };
        let store = SnapshotStore::new(&config);
        let report = store.ingest_chunk(format!("{S1}\n").as_bytes());
        assert_eq!(report.rejected, 1);
        assert!(store
            .status()
            .last_error
            .unwrap()
            .contains("line too long"));
    }

    #[test]
    fn test_mark_stale_keeps_snapshot() {
        let store = SnapshotStore::default();
        store.ingest(S1).unwrap();
        store.mark_stale("producer exited with code 1");
        assert!(store.status().is_stale());
        assert_eq!(store.read().sensors.timestamp, "T1");
    }
}
