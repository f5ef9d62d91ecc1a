// SPDX-License-Identifier: MIT
//
// Event loop for an editor session.
//
// This is the module that wires everything together: raw mode goes on, the
// window size is probed once, and then the loop runs strictly in lockstep:
//
//   paint a frame → flush it in one write → block for one key → dispatch
//
// There is no tick, no background thread, and no resize handling. The loop
// sleeps inside the key read until the user types something.
//
// # Shutdown
//
// Raw mode is held by a `RawModeGuard`. Every way out of `run` passes
// through it, quit key or failure alike, and the guard clears the screen and
// restores the saved terminal mode exactly once. A restore that fails during
// an error shutdown does not hide the loop's error: both come back together
// as `Error::Shutdown`, so the diagnostic names the broken terminal too.

use std::io::{self, Write};
use std::time::Duration;

use crate::error::{Error, Result, TerminalError};
use crate::input::{self, KeyDecoder, KeyEvent};
use crate::output::OutputBuffer;
use crate::probe;
use crate::terminal::{Device, Size};

/// Env var overriding [`LoopConfig::escape_timeout`], in milliseconds.
pub const ESCAPE_TIMEOUT_ENV: &str = "GIGA_ESCAPE_TIMEOUT_MS";

/// Env var overriding [`LoopConfig::probe_timeout`], in milliseconds.
pub const PROBE_TIMEOUT_ENV: &str = "GIGA_PROBE_TIMEOUT_MS";

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Where the loop is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Quitting,
}

/// Application interface for the event loop.
///
/// Each iteration the loop calls [`paint`](App::paint) with a cleared frame
/// buffer, flushes it, reads one key, and hands it to
/// [`on_key`](App::on_key).
pub trait App {
    /// Paint the current state into `frame`.
    ///
    /// The buffer is empty on entry; whatever is written goes to the
    /// terminal in a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if writing into `frame` fails.
    fn paint(&mut self, frame: &mut OutputBuffer, size: Size) -> io::Result<()>;

    /// Handle one decoded key.
    ///
    /// Return [`Action::Quit`] to exit the event loop.
    fn on_key(&mut self, key: KeyEvent, size: Size) -> Action;
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Timing and key configuration for an editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// How long the decoder waits for each byte after `ESC` before settling
    /// on a bare Escape. Default: 25 ms.
    pub escape_timeout: Duration,

    /// How long the size probe waits for each byte of the terminal's
    /// cursor-position reply. Default: 1 s.
    pub probe_timeout: Duration,

    /// The control byte that ends the session. Default: Ctrl-Q.
    pub quit_key: u8,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            escape_timeout: input::DEFAULT_ESCAPE_TIMEOUT,
            probe_timeout: Duration::from_secs(1),
            quit_key: input::ctrl(b'q'),
        }
    }
}

impl LoopConfig {
    /// Defaults, overridden by [`ESCAPE_TIMEOUT_ENV`] and
    /// [`PROBE_TIMEOUT_ENV`] when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults, overridden by whatever `lookup` returns for the env keys.
    ///
    /// Values are whole milliseconds. Anything unparsable is logged and
    /// ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(ms) = millis(&lookup, ESCAPE_TIMEOUT_ENV) {
            config.escape_timeout = ms;
        }
        if let Some(ms) = millis(&lookup, PROBE_TIMEOUT_ENV) {
            config.probe_timeout = ms;
        }
        config
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring invalid timeout");
            None
        }
    }
}

// ─── Raw Mode Guard ──────────────────────────────────────────────────────────

/// Scoped raw mode on a [`Device`].
///
/// Acquiring enables raw mode; [`release`](Self::release) or dropping the
/// guard restores it. Whichever happens first does the restore, and it
/// happens once.
pub struct RawModeGuard<'a, D: Device> {
    device: &'a mut D,
    armed: bool,
}

impl<'a, D: Device> RawModeGuard<'a, D> {
    /// Enable raw mode on `device`.
    ///
    /// # Errors
    ///
    /// Returns the device's [`TerminalError`]. No guard exists in that case,
    /// so nothing will try to restore a mode that was never saved.
    pub fn acquire(device: &'a mut D) -> Result<Self, TerminalError> {
        device.enable_raw_mode()?;
        Ok(Self {
            device,
            armed: true,
        })
    }

    /// The guarded device.
    pub fn device(&mut self) -> &mut D {
        &mut *self.device
    }

    /// Restore the terminal now and report how it went.
    ///
    /// # Errors
    ///
    /// Returns the device's [`TerminalError`] if the restore fails.
    pub fn release(mut self) -> Result<(), TerminalError> {
        self.armed = false;
        self.device.disable_raw_mode()
    }
}

impl<D: Device> Drop for RawModeGuard<'_, D> {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            if let Err(e) = self.device.disable_raw_mode() {
                tracing::error!(error = %e, "failed to restore terminal");
            }
        }
    }
}

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Run the editor loop on `device` until `app` returns [`Action::Quit`].
///
/// 1. Enables raw mode (on failure, returns before anything is drawn)
/// 2. Probes the window size once
/// 3. Paints, flushes, reads a key, dispatches, until quit or error
/// 4. Clears the screen and restores the terminal, on every path
///
/// # Errors
///
/// Returns the first fatal error: raw-mode entry, size probe, terminal I/O
/// (including end of input). If everything else succeeded, a failed
/// terminal restore is returned instead. If both failed, the result is
/// [`Error::Shutdown`] carrying the two.
pub fn run<D: Device, A: App>(device: &mut D, app: &mut A, config: &LoopConfig) -> Result<()> {
    let mut guard = RawModeGuard::acquire(device)?;
    let result = drive(guard.device(), app, config);
    let restored = guard.release();

    match (result, restored) {
        (Err(e), Err(restore)) => {
            tracing::warn!(error = %restore, "terminal restore also failed during shutdown");
            Err(Error::Shutdown {
                cause: Box::new(e),
                restore,
            })
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), Err(restore)) => Err(restore.into()),
        (Ok(()), Ok(())) => Ok(()),
    }
}

/// The loop body, separated so the guard sees every outcome.
fn drive<D: Device, A: App>(device: &mut D, app: &mut A, config: &LoopConfig) -> Result<()> {
    let primary = device.query_size();
    let (input, output) = device.streams();
    let size = probe::window_size(primary, input, output, config.probe_timeout)?;
    tracing::info!(rows = size.rows, cols = size.cols, "editor session started");

    let decoder = KeyDecoder::with_timeout(config.escape_timeout);
    let mut frame = OutputBuffer::new();
    let mut state = LoopState::Running;

    while state == LoopState::Running {
        frame.clear();
        app.paint(&mut frame, size)?;
        frame.flush_to(output)?;

        let key = decoder.next_key(input)?;
        tracing::trace!(?key, "key");

        if key == KeyEvent::Eof {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "terminal input closed").into());
        }

        if app.on_key(key, size) == Action::Quit {
            tracing::info!("quit requested");
            state = LoopState::Quitting;
        }
    }

    Ok(())
}

/// Turn the outcome of [`run`] into a process exit status.
///
/// Success is 0. Any error prints one `program: message` line to `err` and
/// gives 1.
pub fn exit_code(result: &Result<()>, program: &str, err: &mut impl Write) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "{program}: {e}");
            1
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
