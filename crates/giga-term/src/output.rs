// SPDX-License-Identifier: MIT
//
// Frame output buffering.
//
// Every escape sequence and every row of content for one frame goes into
// an `OutputBuffer` first. A single flush at frame end writes it all at
// once, so the terminal never shows a half-drawn screen and the editor pays
// for one `write()` syscall per frame instead of dozens.
//
// The buffer is append-only between flushes. `flush_to` empties it, keeping
// the allocation for the next frame.

use std::io::{self, Write};

/// A byte buffer that accumulates one frame for a single write.
///
/// Default capacity: 16 KB. A full 80×24 frame with escapes is a few KB,
/// so most terminals never reallocate.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Discard everything accumulated so far (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` in one call, flush `w`, and clear.
    ///
    /// An empty buffer still flushes `w`, so a frame always reaches the
    /// device even when nothing was drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing `w` fails. The buffer is
    /// left untouched in that case.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&self.buf)?;
        w.flush()?;
        self.buf.clear();
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
