//! # giga-editor: editor core for giga
//!
//! The part of the editor that sits above the terminal plumbing in
//! `giga-term`:
//!
//! - **[`cursor`]**: `Cursor` (row, col) with movement clamped to the window
//! - **[`screen`]**: frame rendering: rows, `~` placeholders, welcome banner
//! - **[`editor`]**: `Editor`, the session state the event loop drives
//!
//! Text storage and editing are not here yet. Anything that can hand out
//! rows by index plugs into the renderer through [`screen::RowSource`].

pub mod cursor;
pub mod editor;
pub mod screen;

pub use cursor::Cursor;
pub use editor::Editor;
pub use screen::{NoRows, RowSource};
