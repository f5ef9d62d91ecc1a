//! Cursor: screen position with clamped movement.
//!
//! The `Cursor` is a (row, col) pair in screen cells, 0-indexed. Every
//! movement takes the current window [`Size`] and leaves the cursor inside
//! it: row in `0..rows`, col in `0..cols`.
//!
//! There is no document behind the cursor yet, so there is no sticky column
//! and no scrolling. Pushing past an edge is a silent no-op on that axis.
//!
//! # Page movement
//!
//! [`page_move`](Cursor::page_move) is `rows` single steps in one
//! direction. On a screen with no scrollback that lands on the first or
//! last row, which is all "a page" can mean here.

use giga_term::{Direction, Size};

/// A cursor on the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    row: u16,
    col: u16,
}

impl Cursor {
    /// Create a cursor at the top-left cell.
    #[must_use]
    pub const fn new() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Create a cursor at a specific cell. Not clamped; see [`clamp`](Self::clamp).
    #[must_use]
    pub const fn at(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    // -- Accessors ----------------------------------------------------------

    /// Current row (0-indexed).
    #[inline]
    #[must_use]
    pub const fn row(&self) -> u16 {
        self.row
    }

    /// Current column (0-indexed).
    #[inline]
    #[must_use]
    pub const fn col(&self) -> u16 {
        self.col
    }

    // -- Movement -----------------------------------------------------------

    /// Move one cell in `direction`, staying inside `bounds`.
    pub fn move_to(&mut self, direction: Direction, bounds: Size) {
        match direction {
            Direction::Up => self.row = self.row.saturating_sub(1),
            Direction::Left => self.col = self.col.saturating_sub(1),
            Direction::Down => {
                if self.row < last(bounds.rows) {
                    self.row += 1;
                }
            }
            Direction::Right => {
                if self.col < last(bounds.cols) {
                    self.col += 1;
                }
            }
        }
        self.clamp(bounds);
    }

    /// Move to column 0.
    pub const fn home(&mut self) {
        self.col = 0;
    }

    /// Move to the last column.
    pub const fn end(&mut self, bounds: Size) {
        self.col = last(bounds.cols);
    }

    /// Move `bounds.rows` cells in `direction`.
    ///
    /// Same result as that many [`move_to`](Self::move_to) calls, computed
    /// in one step.
    pub fn page_move(&mut self, direction: Direction, bounds: Size) {
        let steps = bounds.rows;
        match direction {
            Direction::Up => self.row = self.row.saturating_sub(steps),
            Direction::Down => self.row = self.row.saturating_add(steps),
            Direction::Left => self.col = self.col.saturating_sub(steps),
            Direction::Right => self.col = self.col.saturating_add(steps),
        }
        self.clamp(bounds);
    }

    /// Pull the cursor back inside `bounds`.
    pub fn clamp(&mut self, bounds: Size) {
        self.row = self.row.min(last(bounds.rows));
        self.col = self.col.min(last(bounds.cols));
    }
}

/// Highest valid index on an axis of `len` cells. A zero-length axis pins
/// to 0.
const fn last(len: u16) -> u16 {
    len.saturating_sub(1)
}
