//! Line reassembly for the newline-delimited wire protocol.
//!
//! The socket hands us chunks cut at arbitrary byte boundaries; this module
//! turns them back into complete lines. At most one unterminated fragment is
//! carried between reads, and it is prefixed onto the next completed line.

use bytes::BytesMut;
use tracing::warn;

/// Reassembles newline-terminated lines from arbitrarily chunked reads.
#[derive(Debug, Default)]
pub struct FrameReader {
    /// Bytes read but not yet followed by a line feed.
    partial: BytesMut,
}

impl FrameReader {
    /// Create a new reader with no carried-over fragment.
    pub fn new() -> Self {
        FrameReader {
            partial: BytesMut::new(),
        }
    }

    /// Feed one read chunk, returning every line it completes, in order.
    ///
    /// A chunk with no line feed only extends the carried-over fragment.
    /// Otherwise the fragment is prefixed onto the first piece, every piece
    /// except the last is emitted, and the last piece becomes the new
    /// fragment (nothing is carried when the chunk ends exactly on a line
    /// feed). A trailing carriage return on an emitted line is trimmed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if !chunk.contains(&b'\n') {
            self.partial.extend_from_slice(chunk);
            return Vec::new();
        }

        let mut pieces: Vec<&[u8]> = chunk.split(|&b| b == b'\n').collect();
        // split() on a chunk containing '\n' yields at least two pieces
        let tail = pieces.pop().unwrap_or_default();

        let mut lines = Vec::with_capacity(pieces.len());
        for piece in pieces {
            self.partial.extend_from_slice(piece);
            let line = self.partial.split();
            if let Some(line) = finish_line(&line) {
                lines.push(line);
            }
        }

        self.partial.extend_from_slice(tail);
        lines
    }

    /// Whether an unterminated fragment is currently held.
    #[cfg(test)]
    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}

/// Convert a completed line to text, trimming an insignificant trailing
/// carriage return. Non-UTF-8 lines are dropped (recoverable).
fn finish_line(raw: &[u8]) -> Option<String> {
    let raw = match raw.last() {
        Some(b'\r') => &raw[..raw.len() - 1],
        _ => raw,
    };

    match std::str::from_utf8(raw) {
        Ok(line) => Some(line.to_owned()),
        Err(e) => {
            warn!(error = %e, "dropping non-UTF-8 line");
            None
        }
    }
}
