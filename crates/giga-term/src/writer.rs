// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Stdout byte sink: raw writes to the terminal's file descriptor.
//
// `io::Stdout` is line buffered. Handed a frame, it writes everything up to
// the last newline and holds the tail until the next flush, so one frame
// reaches the terminal as two `write()` calls and the terminal can paint
// the first half before the second arrives.
//
// `StdoutSink` goes straight to fd 1 with `libc::write`, the output-side
// twin of `StdinSource`. Whatever `write` is handed is in the kernel when it
// returns, and `flush` has nothing left to do.

use std::io::{self, Write};

/// Writes to stdout without any userspace buffering.
#[derive(Debug)]
pub struct StdoutSink {
    #[cfg(unix)]
    fd: libc::c_int,
}

impl StdoutSink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            fd: libc::STDOUT_FILENO,
        }
    }

    /// A sink on another descriptor, for exercising the write path.
    #[cfg(all(unix, test))]
    const fn on_fd(fd: libc::c_int) -> Self {
        Self { fd }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Write for StdoutSink {
    /// One `write(2)`, retried on `EINTR`. May be partial; `write_all` loops.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let n = unsafe { libc::write(self.fd, buf.as_ptr().cast::<libc::c_void>(), buf.len()) };
            if let Ok(written) = usize::try_from(n) {
                return Ok(written);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Non-unix fallback: each write goes through the stdout lock and is
/// flushed before returning.
#[cfg(not(unix))]
impl Write for StdoutSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = io::stdout().lock();
        out.write_all(buf)?;
        out.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
