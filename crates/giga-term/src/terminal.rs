// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, size queries, and the real device.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd writes. These are
// the standard POSIX interfaces for terminal control; there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// `RawMode` owns the terminal's saved state. `enable` captures the cooked
// termios and switches to raw; `disable` clears the screen and puts the
// saved termios back. The saved value is taken out on restore, so it can be
// consumed exactly once.
//
// A panic hook covers the one path the editor loop's guard cannot: it
// bypasses Rust's stdout lock, writes a pre-built clear-and-show-cursor
// sequence straight to fd 1, restores termios from a global backup, and
// then lets the original hook print the message to a working terminal.
//
// That backup is the one copy of the saved termios outside `RawMode`. It is
// written by `enable`, cleared by `disable`, and only ever read by the hook.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::error::TerminalError;
use crate::input::ByteSource;
use crate::reader::StdinSource;
use crate::writer::StdoutSink;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or either
/// dimension is reported as zero. The pixel fields are ignored.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}


// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// [`RawMode`] owns its own copy, but the panic hook can't reach it. This
/// global backup behind a [`Mutex`] lets the hook
/// restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        if let Some(original) = guard.take() {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original);
            }
        }
    }
}

/// Terminal restore sequence for emergency use: clear screen, cursor home,
/// show cursor.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Ensures the panic hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if the panic
/// occurred while the lock was held (e.g., mid-frame flush).
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Raw Mode ───────────────────────────────────────────────────────────────

/// Raw-mode controller for stdin.
///
/// Holds the cooked-mode termios captured by [`enable`](Self::enable) until
/// [`disable`](Self::disable) consumes it. If the value is dropped while
/// still holding a saved mode, the drop restores it best-effort.
pub struct RawMode {
    #[cfg(unix)]
    original: Option<libc::termios>,
    #[cfg(not(unix))]
    enabled: bool,
}

impl RawMode {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original: None,
            #[cfg(not(unix))]
            enabled: false,
        }
    }

    /// Whether a saved mode is being held (raw mode is on).
    #[cfg(unix)]
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.original.is_some()
    }

    #[cfg(not(unix))]
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch stdin to raw mode and remember the previous mode.
    ///
    /// Raw here means: no line buffering, no echo, no signals from Ctrl-C
    /// or Ctrl-Z, no flow control, no CR→NL translation, no output
    /// post-processing, and 8-bit characters.
    ///
    /// # Errors
    ///
    /// - [`TerminalError::GetAttributes`] if stdin is not a terminal
    /// - [`TerminalError::SetAttributes`] if the device rejects raw mode
    /// - [`TerminalError::AlreadyEnabled`] if a mode is already saved
    #[cfg(unix)]
    pub fn enable(&mut self) -> Result<(), TerminalError> {
        if self.original.is_some() {
            return Err(TerminalError::AlreadyEnabled);
        }

        install_panic_hook();

        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(TerminalError::GetAttributes(io::Error::last_os_error()));
            }
            let original = termios;

            // cfmakeraw equivalent: disable all line processing.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(TerminalError::SetAttributes(io::Error::last_os_error()));
            }

            self.original = Some(original);
        }

        // Also save to global backup for the panic hook.
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = self.original;
        }

        tracing::info!("terminal raw mode enabled");
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn enable(&mut self) -> Result<(), TerminalError> {
        Err(TerminalError::GetAttributes(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a unix terminal",
        )))
    }

    /// Clear the screen on `out`, then restore the saved mode.
    ///
    /// The saved mode is consumed even if the clear fails, so the restore is
    /// always attempted exactly once.
    ///
    /// # Errors
    ///
    /// - [`TerminalError::NotEnabled`] if no mode was ever saved
    /// - [`TerminalError::SetAttributes`] if the device rejects the restore
    /// - [`TerminalError::Clear`] if only the screen clear failed
    #[cfg(unix)]
    pub fn disable(&mut self, out: &mut impl Write) -> Result<(), TerminalError> {
        let original = self.original.take().ok_or(TerminalError::NotEnabled)?;

        let cleared = clear_for_exit(out);

        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                return Err(TerminalError::SetAttributes(io::Error::last_os_error()));
            }
        }

        // Clear the global backup now that the mode is restored.
        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }

        tracing::info!("terminal mode restored");
        cleared.map_err(TerminalError::Clear)
    }

    #[cfg(not(unix))]
    pub fn disable(&mut self, out: &mut impl Write) -> Result<(), TerminalError> {
        if !self.enabled {
            return Err(TerminalError::NotEnabled);
        }
        self.enabled = false;
        clear_for_exit(out).map_err(TerminalError::Clear)
    }
}

impl Default for RawMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.is_enabled() {
            let _ = self.disable(&mut StdoutSink::new());
        }
    }
}

/// Leave a blank screen with the cursor home and visible.
fn clear_for_exit(out: &mut impl Write) -> io::Result<()> {
    ansi::clear_screen(out)?;
    ansi::cursor_home(out)?;
    ansi::cursor_show(out)?;
    out.flush()
}

// ─── Device ─────────────────────────────────────────────────────────────────

/// The terminal device the editor loop drives.
///
/// One seam for everything that touches the real terminal, so the loop can
/// run against fabricated input and fabricated sizes in tests.
pub trait Device {
    type Input: ByteSource;
    type Output: Write;

    /// Enter raw mode, saving the current mode.
    ///
    /// # Errors
    ///
    /// Returns a [`TerminalError`] if the device does not support it.
    fn enable_raw_mode(&mut self) -> Result<(), TerminalError>;

    /// Clear the screen and restore the saved mode.
    ///
    /// # Errors
    ///
    /// Returns a [`TerminalError`] if nothing was saved or the restore is
    /// rejected.
    fn disable_raw_mode(&mut self) -> Result<(), TerminalError>;

    /// The device's direct size query, if it has one that works.
    fn query_size(&mut self) -> Option<Size>;

    /// Input and output streams, borrowed together.
    fn streams(&mut self) -> (&mut Self::Input, &mut Self::Output);
}

/// The controlling terminal: stdin, stdout, and their raw-mode state.
///
/// Both streams are unbuffered, so a frame handed to the output in one
/// `write_all` reaches the terminal in one `write(2)`.
pub struct Tty {
    raw: RawMode,
    input: StdinSource,
    output: StdoutSink,
}

impl Tty {
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawMode::new(),
            input: StdinSource::new(),
            output: StdoutSink::new(),
        }
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for Tty {
    type Input = StdinSource;
    type Output = StdoutSink;

    fn enable_raw_mode(&mut self) -> Result<(), TerminalError> {
        self.raw.enable()
    }

    fn disable_raw_mode(&mut self) -> Result<(), TerminalError> {
        self.raw.disable(&mut self.output)
    }

    fn query_size(&mut self) -> Option<Size> {
        get_size()
    }

    fn streams(&mut self) -> (&mut StdinSource, &mut StdoutSink) {
        (&mut self.input, &mut self.output)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
