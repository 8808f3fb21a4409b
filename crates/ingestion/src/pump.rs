//! Stream pump: drives an async byte stream into the snapshot store.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, instrument, warn};

use crate::store::{IngestReport, SnapshotStore};

/// Totals for one stream, reported when it ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    /// Reads that returned data
    pub chunks: u64,
    /// Bytes read
    pub bytes: u64,
    /// Complete lines seen
    pub lines: u64,
    /// Snapshots accepted
    pub accepted: u64,
    /// Lines rejected
    pub rejected: u64,
}

impl PumpSummary {
    fn absorb(&mut self, report: IngestReport) {
        self.lines += report.lines as u64;
        self.accepted += report.accepted as u64;
        self.rejected += report.rejected as u64;
    }
}

/// Read `reader` until end of stream, feeding every chunk to `store`
///
/// Chunk boundaries are arbitrary; the store's framer reassembles lines.
/// A read error ends the stream like EOF does, after which the error is
/// returned.
#[instrument(name = "ingestion_pump", skip(reader, store))]
pub async fn pump<R>(
    mut reader: R,
    store: &SnapshotStore,
    read_buffer_bytes: usize,
) -> std::io::Result<PumpSummary>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; read_buffer_bytes.max(1)];
    let mut summary = PumpSummary::default();

    debug!("Stream pump started");

    let outcome = loop {
        match reader.read(&mut buf).await {
            Ok(0) => break Ok(()),
            Ok(n) => {
                summary.chunks += 1;
                summary.bytes += n as u64;
                summary.absorb(store.ingest_chunk(&buf[..n]));
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "Stream read failed");
                break Err(e);
            }
        }
    };

    summary.absorb(store.finish_stream());

    info!(
        bytes = summary.bytes,
        lines = summary.lines,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "Stream ended"
    );

    outcome.map(|()| summary)
}
