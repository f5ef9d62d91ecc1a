// SPDX-License-Identifier: MIT
//
// Error types for the terminal protocol layer.
//
// Three failure families, all fatal to the editor:
//
//   TerminalError: raw mode could not be entered or restored.
//   ProbeError:    the window size could not be determined, including a
//                   malformed cursor-position reply.
//   Io:            a read or write on the terminal streams failed.
//
// Malformed key sequences are deliberately absent: the decoder resolves
// those to `KeyEvent::Escape` and the loop carries on.

use std::io;

use thiserror::Error;

/// Raw-mode enable/disable failure.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// `tcgetattr` failed, usually because stdin is not a terminal.
    #[error("cannot read terminal attributes: {0}")]
    GetAttributes(#[source] io::Error),

    /// The device rejected the new (or restored) attributes.
    #[error("cannot apply terminal attributes: {0}")]
    SetAttributes(#[source] io::Error),

    /// `enable` was called while a saved mode is still held.
    #[error("raw mode is already enabled")]
    AlreadyEnabled,

    /// `disable` was called without a saved mode to restore.
    #[error("raw mode was never enabled")]
    NotEnabled,

    /// Writing the screen clear that precedes a restore failed.
    #[error("cannot clear screen before restoring terminal: {0}")]
    Clear(#[source] io::Error),
}

/// Window-size discovery failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The reply did not start with `ESC [`.
    #[error("cursor position report has no `ESC [` lead-in")]
    MissingLeadIn,

    /// The reply ended (or the wait expired) before the `R` terminator.
    #[error("cursor position report is not terminated by `R`")]
    MissingTerminator,

    /// No `;` between the row and column fields.
    #[error("cursor position report has no `;` separator")]
    MissingSeparator,

    /// A row or column field is empty, non-numeric, or out of range.
    #[error("cursor position report has an invalid {0} field")]
    InvalidField(&'static str),

    /// The terminal reported a zero row or column count.
    #[error("terminal reported a zero-sized window ({rows}x{cols})")]
    ZeroSize { rows: u16, cols: u16 },

    /// The round trip itself failed.
    #[error("cursor position query failed: {0}")]
    Io(#[from] io::Error),
}

/// Any fatal error raised by the terminal layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),

    /// The session failed, and restoring the terminal afterwards failed too.
    #[error("{cause} (terminal restore also failed: {restore})")]
    Shutdown {
        #[source]
        cause: Box<Error>,
        restore: TerminalError,
    },
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Tests ───────────────────────────────────────────────────────────────────
