// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Stdin byte source: raw reads from the terminal's file descriptor.
//
// The decoder needs two kinds of read: one that blocks until the user types
// something, and one that gives up after a few milliseconds so a lone ESC
// can be told apart from the start of an escape sequence.
//
// Both go straight to fd 0 with `libc::read`, bypassing `io::stdin()`'s
// internal buffer: a buffered reader would swallow the bytes `poll()` is
// supposed to see, and the bounded wait would then time out on data that
// had already arrived. The bounded wait is a single `poll()` on stdin.

use std::io;
use std::time::Duration;

use crate::input::ByteSource;

/// Reads single bytes from stdin without any userspace buffering.
///
/// Raw mode sets `VMIN=1, VTIME=0`, so a plain `read()` blocks until at
/// least one byte is available.
#[derive(Debug, Default)]
pub struct StdinSource {
    _private: (),
}

impl StdinSource {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Read one byte, retrying on `EINTR`. `Ok(None)` on end of file.
    #[cfg(unix)]
    fn read_one() -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        loop {
            let n = unsafe {
                libc::read(
                    libc::STDIN_FILENO,
                    (&raw mut byte).cast::<libc::c_void>(),
                    1,
                )
            };
            match n {
                1 => return Ok(Some(byte)),
                0 => return Ok(None),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Wait up to `timeout` for stdin to become readable.
    #[cfg(unix)]
    fn poll_readable(timeout: Duration) -> io::Result<bool> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, millis) };
        match ready {
            0 => Ok(false),
            n if n > 0 => Ok(true),
            _ => {
                let err = io::Error::last_os_error();
                // A signal during the wait counts as "nothing arrived".
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Self::read_one()
    }

    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        if Self::poll_readable(timeout)? {
            Self::read_one()
        } else {
            Ok(None)
        }
    }
}

/// Non-unix fallback: blocking reads through `io::stdin()`, no bounded wait.
///
/// Without `poll()` a continuation byte cannot be waited for with a limit,
/// so the bounded read degrades to a blocking one.
#[cfg(not(unix))]
impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    fn read_byte_timeout(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
        self.read_byte()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_default_agree() {
        let a = StdinSource::new();
        let b = StdinSource::default();
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }

    #[cfg(unix)]
    #[test]
    fn zero_timeout_poll_does_not_block() {
        // Whatever stdin is under the test harness, a zero-length poll
        // must return immediately without an error.
        assert!(StdinSource::poll_readable(Duration::ZERO).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn huge_timeout_saturates_instead_of_wrapping() {
        let millis = i32::try_from(Duration::from_secs(u64::MAX / 4).as_millis())
            .unwrap_or(i32::MAX);
        assert_eq!(millis, i32::MAX);
    }
}
