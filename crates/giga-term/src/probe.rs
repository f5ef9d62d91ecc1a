// SPDX-License-Identifier: MIT
//
// Window size discovery.
//
// Two methods, each tried once:
//
//   1. `ioctl(TIOCGWINSZ)`: the kernel's idea of the window size. Fails on
//      some serial consoles and multiplexers, or reports 0 columns.
//
//   2. Cursor-position round trip: push the cursor as far right and down as
//      it will go (`ESC[999C ESC[999B`; CUF/CUD clamp at the screen edge
//      rather than wrapping), ask where it landed (`ESC[6n`), and read the
//      terminal's answer `ESC [ rows ; cols R` from stdin.
//
// The reply parser is strict: anything that is not exactly the documented
// shape is a `ProbeError`, never a silently defaulted size.

use std::io::Write;
use std::time::Duration;

use crate::ansi;
use crate::error::ProbeError;
use crate::input::{ByteSource, ESC};
use crate::terminal::Size;

/// Longest cursor-position reply we are willing to read.
///
/// `ESC [ 65535 ; 65535 R` is 14 bytes; anything past 32 is not a reply.
const MAX_REPLY_LEN: usize = 32;

/// Distance used to push the cursor into the bottom-right corner.
const FAR_AWAY: u16 = 999;

/// A decoded `ESC [ row ; col R` reply (1-indexed, as the terminal sends it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorReport {
    pub row: u16,
    pub col: u16,
}

/// Determine the window size.
///
/// `primary` is the result of the direct device query (normally
/// [`terminal::get_size`](crate::terminal::get_size)). When it is `None`,
/// the cursor-position fallback runs against `input`/`output`, waiting at
/// most `timeout` for each reply byte.
///
/// # Errors
///
/// Returns a [`ProbeError`] if the fallback's I/O fails or the reply is
/// malformed, missing, or reports a zero dimension.
pub fn window_size(
    primary: Option<Size>,
    input: &mut impl ByteSource,
    output: &mut impl Write,
    timeout: Duration,
) -> Result<Size, ProbeError> {
    if let Some(size) = primary.filter(|s| s.rows > 0 && s.cols > 0) {
        tracing::debug!(rows = size.rows, cols = size.cols, "window size from ioctl");
        return Ok(size);
    }

    tracing::debug!("ioctl size unavailable, falling back to cursor position report");
    ansi::cursor_forward(output, FAR_AWAY)?;
    ansi::cursor_down(output, FAR_AWAY)?;
    let report = query_cursor_position(input, output, timeout)?;

    if report.row == 0 || report.col == 0 {
        return Err(ProbeError::ZeroSize {
            rows: report.row,
            cols: report.col,
        });
    }

    let size = Size {
        rows: report.row,
        cols: report.col,
    };
    tracing::debug!(rows = size.rows, cols = size.cols, "window size from cursor report");
    Ok(size)
}

/// Send `ESC[6n` and parse the terminal's reply.
///
/// # Errors
///
/// Returns a [`ProbeError`] if writing the request or reading the reply
/// fails, or if the reply is malformed.
pub fn query_cursor_position(
    input: &mut impl ByteSource,
    output: &mut impl Write,
    timeout: Duration,
) -> Result<CursorReport, ProbeError> {
    ansi::request_cursor_position(output)?;
    output.flush()?;

    let mut reply = [0u8; MAX_REPLY_LEN];
    let mut len = 0;
    while len < MAX_REPLY_LEN {
        let Some(byte) = input.read_byte_timeout(timeout)? else {
            break;
        };
        reply[len] = byte;
        len += 1;
        if byte == b'R' {
            break;
        }
    }

    parse_cursor_report(&reply[..len])
}

/// Parse a complete `ESC [ row ; col R` reply.
///
/// # Errors
///
/// - [`ProbeError::MissingLeadIn`] if the reply does not start with `ESC [`
/// - [`ProbeError::MissingTerminator`] if it does not end with `R`
/// - [`ProbeError::MissingSeparator`] if there is no `;`
/// - [`ProbeError::InvalidField`] if a field is empty, non-numeric, or
///   larger than `u16::MAX`
pub fn parse_cursor_report(reply: &[u8]) -> Result<CursorReport, ProbeError> {
    let body = reply
        .strip_prefix(&[ESC, b'['])
        .ok_or(ProbeError::MissingLeadIn)?;
    let body = body
        .strip_suffix(b"R")
        .ok_or(ProbeError::MissingTerminator)?;

    let sep = body
        .iter()
        .position(|&b| b == b';')
        .ok_or(ProbeError::MissingSeparator)?;

    Ok(CursorReport {
        row: parse_field(&body[..sep], "row")?,
        col: parse_field(&body[sep + 1..], "column")?,
    })
}

/// Parse a non-empty run of ASCII digits into a `u16`.
fn parse_field(digits: &[u8], name: &'static str) -> Result<u16, ProbeError> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ProbeError::InvalidField(name));
    }
    digits.iter().try_fold(0u16, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(u16::from(d - b'0')))
            .ok_or(ProbeError::InvalidField(name))
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
