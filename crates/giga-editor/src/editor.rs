//! Editor: the session state driven by the event loop.
//!
//! An `Editor` owns the cursor and the row content and implements
//! [`App`]: the loop asks it to paint and hands it one key at a time.
//!
//! Key dispatch:
//!
//! | Key                 | Effect                          |
//! |---------------------|---------------------------------|
//! | quit key (Ctrl-Q)   | end the session                 |
//! | arrows              | move one cell                   |
//! | Home / End          | first / last column             |
//! | PageUp / PageDown   | move a screen's height          |
//! | anything else       | nothing                         |

use std::io;

use giga_term::{Action, App, Direction, KeyEvent, LoopConfig, OutputBuffer, Size};

use crate::cursor::Cursor;
use crate::screen::{self, NoRows, RowSource};

/// Editing session over a row source.
#[derive(Debug, Clone)]
pub struct Editor<R = NoRows> {
    cursor: Cursor,
    quit_key: u8,
    rows: R,
}

impl Editor {
    /// An empty session that quits on `quit_key`.
    #[must_use]
    pub const fn new(quit_key: u8) -> Self {
        Self::with_rows(quit_key, NoRows)
    }

    /// An empty session configured from `config`.
    #[must_use]
    pub const fn from_config(config: &LoopConfig) -> Self {
        Self::new(config.quit_key)
    }
}

impl<R: RowSource> Editor<R> {
    /// A session that shows `rows`.
    #[must_use]
    pub const fn with_rows(quit_key: u8, rows: R) -> Self {
        Self {
            cursor: Cursor::new(),
            quit_key,
            rows,
        }
    }

    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub const fn quit_key(&self) -> u8 {
        self.quit_key
    }
}

impl<R: RowSource> App for Editor<R> {
    fn paint(&mut self, frame: &mut OutputBuffer, size: Size) -> io::Result<()> {
        self.cursor.clamp(size);
        screen::render_frame(frame, size, self.cursor, &self.rows)
    }

    fn on_key(&mut self, key: KeyEvent, size: Size) -> Action {
        match key {
            KeyEvent::Control(byte) if byte == self.quit_key => {
                tracing::debug!("quit key pressed");
                return Action::Quit;
            }
            KeyEvent::Arrow(dir) => self.cursor.move_to(dir, size),
            KeyEvent::Home => self.cursor.home(),
            KeyEvent::End => self.cursor.end(size),
            KeyEvent::PageUp => self.cursor.page_move(Direction::Up, size),
            KeyEvent::PageDown => self.cursor.page_move(Direction::Down, size),
            _ => {
                tracing::trace!(?key, "key has no binding");
                return Action::Continue;
            }
        }
        tracing::trace!(
            ?key,
            row = self.cursor.row(),
            col = self.cursor.col(),
            "cursor moved"
        );
        Action::Continue
    }
}
