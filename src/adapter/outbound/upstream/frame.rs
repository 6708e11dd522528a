//! Double-newline frame splitting.

use tracing::warn;

const DELIMITER: &[u8] = b"\n\n";

/// Largest partial frame kept while waiting for a delimiter.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Accumulates raw bytes and yields complete frames.
///
/// Partial frames stay buffered until their delimiter arrives. Frames that
/// are blank after trimming are skipped. A partial frame that grows past the
/// size cap is discarded along with the rest of that frame.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    scanned: usize,
    max_frame: usize,
    discarding: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_frame(MAX_FRAME_BYTES)
    }
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_frame,
            discarding: false,
        }
    }

    /// Append a chunk and drain every complete frame.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;
        // Bytes before `scanned` were already searched on an earlier push.
        let mut from = self.scanned;

        while let Some(pos) = find(&self.buf[from..], DELIMITER) {
            let end = from + pos;
            if self.discarding {
                self.discarding = false;
            } else {
                let frame = String::from_utf8_lossy(&self.buf[start..end]);
                let frame = frame.trim();
                if !frame.is_empty() {
                    frames.push(frame.to_string());
                }
            }
            start = end + DELIMITER.len();
            from = start;
        }

        self.buf.drain(..start);
        if self.buf.len() > self.max_frame {
            warn!(
                buffered = self.buf.len(),
                max = self.max_frame,
                "Discarding oversized upstream frame"
            );
            // Keep the last byte: it may be the first half of a delimiter.
            let keep = self.buf.len() - 1;
            self.buf.drain(..keep);
            self.discarding = true;
        }
        self.scanned = self.buf.len().saturating_sub(DELIMITER.len() - 1);
        frames
    }

    /// Bytes waiting for a delimiter.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
