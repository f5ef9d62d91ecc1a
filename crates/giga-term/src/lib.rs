// SPDX-License-Identifier: MIT
//
// giga-term: terminal plumbing for the giga editor.
//
// Raw mode through termios, window size through `TIOCGWINSZ` with a
// cursor-position fallback, a small state-machine key decoder, and a frame
// buffer that reaches the terminal in one write. On top of that sits a
// lockstep event loop that paints, reads a key, and dispatches it to an
// `App`.
//
// No TUI framework is involved: every escape sequence is written by hand
// in `ansi`, and every byte of input goes through `input`.

pub mod ansi;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod probe;
pub mod reader;
pub mod terminal;
pub mod writer;

pub use error::{Error, ProbeError, Result, TerminalError};
pub use event_loop::{Action, App, LoopConfig, RawModeGuard, exit_code, run};
pub use input::{Direction, KeyDecoder, KeyEvent};
pub use output::OutputBuffer;
pub use terminal::{Device, Size, Tty};
pub use writer::StdoutSink;
