//! Incremental line framer
//!
//! Accumulates bytes from a stream, yields complete newline-terminated lines
//! and keeps any unterminated tail for the next chunk.

use bytes::{Bytes, BytesMut};
use contracts::PartialLinePolicy;
use tracing::debug;

/// Output of the framer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramedLine {
    /// Complete line, terminator (`\n` or `\r\n`) stripped
    Line(Bytes),

    /// Line longer than the limit; its bytes were dropped
    Oversized { len: usize },
}

/// Buffering line splitter
///
/// Blank lines are skipped. A line that grows past `max_line_bytes` is
/// dropped in full, including the part that arrives after the limit was hit.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_line_bytes: usize,
    /// Bytes at the front of `buf` already known to hold no newline
    scanned: usize,
    /// Skipping the remainder of an oversized line
    discarding: bool,
    discarded_len: usize,
}

impl LineFramer {
    /// Create a framer with the given per-line limit
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_line_bytes.min(8 * 1024)),
            max_line_bytes,
            scanned: 0,
            discarding: false,
            discarded_len: 0,
        }
    }

    /// Bytes buffered but not yet part of a complete line
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Feed a chunk, returning every line it completes, in arrival order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FramedLine> {
        let mut out = Vec::new();
        self.buf.extend_from_slice(chunk);

        while let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let newline = self.scanned + offset;
            let mut line = self.buf.split_to(newline + 1);
            self.scanned = 0;
            line.truncate(newline);
            strip_carriage_return(&mut line);

            if self.discarding {
                self.discarding = false;
                let len = std::mem::take(&mut self.discarded_len) + line.len();
                out.push(FramedLine::Oversized { len });
                continue;
            }

            if line.len() > self.max_line_bytes {
                out.push(FramedLine::Oversized { len: line.len() });
                continue;
            }

            if is_blank(&line) {
                continue;
            }

            out.push(FramedLine::Line(line.freeze()));
        }

        self.scanned = self.buf.len();

        if self.buf.len() > self.max_line_bytes {
            self.discarded_len += self.buf.len();
            self.buf.clear();
            self.scanned = 0;
            self.discarding = true;
        }

        out
    }

    /// End of stream: resolve whatever is still buffered
    pub fn finish(&mut self, policy: PartialLinePolicy) -> Option<FramedLine> {
        let mut rest = self.buf.split();
        self.scanned = 0;

        if std::mem::take(&mut self.discarding) {
            let len = std::mem::take(&mut self.discarded_len) + rest.len();
            return Some(FramedLine::Oversized { len });
        }

        strip_carriage_return(&mut rest);
        if is_blank(&rest) {
            return None;
        }

        match policy {
            PartialLinePolicy::Discard => {
                debug!(bytes = rest.len(), "Dropping unterminated tail at end of stream");
                None
            }
            PartialLinePolicy::FlushOnEof => Some(FramedLine::Line(rest.freeze())),
        }
    }
}

fn strip_carriage_return(line: &mut BytesMut) {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
