//! Screen: one frame of rows, cursor last.
//!
//! [`render_frame`] writes a complete screen into a frame buffer:
//!
//! ```text
//! ESC[?25l ESC[H            hide cursor, go home
//! row 0 ESC[K \r\n          content (truncated to cols), erase the rest
//! row 1 ESC[K \r\n
//! ...
//! row n-1 ESC[K             no line break after the last row
//! ESC[r;cH ESC[?25h         place the cursor, show it
//! ```
//!
//! Rows come from a [`RowSource`]. Rows it has nothing for get a `~`, and
//! the row a third of the way down gets the welcome banner instead.
//!
//! Nothing here touches the terminal. The caller flushes the buffer in one
//! write once the frame is complete.

use std::io::{self, Write};

use giga_term::{Size, ansi};

use crate::cursor::Cursor;

/// The welcome line, shown on an empty screen.
pub const BANNER: &str = concat!("Giga editor -- version ", env!("CARGO_PKG_VERSION"));

/// Marker for a row with no content.
const EMPTY_ROW: &[u8] = b"~";

/// Content for screen rows, by row index.
pub trait RowSource {
    /// The bytes for row `index`, or `None` if the source has nothing there.
    fn row(&self, index: usize) -> Option<&[u8]>;
}

/// A source with no rows at all. Every row renders as a placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRows;

impl RowSource for NoRows {
    fn row(&self, _index: usize) -> Option<&[u8]> {
        None
    }
}

impl RowSource for [&[u8]] {
    fn row(&self, index: usize) -> Option<&[u8]> {
        self.get(index).copied()
    }
}

impl<T: RowSource + ?Sized> RowSource for &T {
    fn row(&self, index: usize) -> Option<&[u8]> {
        (**self).row(index)
    }
}

/// Write one full frame for a `size` screen into `frame`.
///
/// Emits exactly `size.rows` row segments, each at most `size.cols` bytes
/// before its erase sequence.
///
/// # Errors
///
/// Returns an error if writing into `frame` fails.
pub fn render_frame<R: RowSource + ?Sized>(
    frame: &mut impl Write,
    size: Size,
    cursor: Cursor,
    rows: &R,
) -> io::Result<()> {
    let cols = usize::from(size.cols);
    let banner_row = usize::from(size.rows / 3);

    ansi::cursor_hide(frame)?;
    ansi::cursor_home(frame)?;

    for index in 0..usize::from(size.rows) {
        match rows.row(index) {
            Some(content) => frame.write_all(truncate(content, cols))?,
            None if index == banner_row => write_banner(frame, cols)?,
            None => frame.write_all(truncate(EMPTY_ROW, cols))?,
        }
        ansi::erase_line(frame)?;
        if index + 1 < usize::from(size.rows) {
            frame.write_all(b"\r\n")?;
        }
    }

    ansi::cursor_to(frame, cursor.row(), cursor.col())?;
    ansi::cursor_show(frame)
}

/// The banner, centered in `cols`, with the row's `~` in the left margin.
fn write_banner(frame: &mut impl Write, cols: usize) -> io::Result<()> {
    let text = truncate(BANNER.as_bytes(), cols);
    let mut padding = (cols - text.len()) / 2;
    if padding > 0 {
        frame.write_all(EMPTY_ROW)?;
        padding -= 1;
    }
    for _ in 0..padding {
        frame.write_all(b" ")?;
    }
    frame.write_all(text)
}

fn truncate(bytes: &[u8], cols: usize) -> &[u8] {
    &bytes[..bytes.len().min(cols)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn render<R: RowSource + ?Sized>(size: Size, cursor: Cursor, rows: &R) -> Vec<u8> {
        let mut out = Vec::new();
        render_frame(&mut out, size, cursor, rows).unwrap();
        out
    }

    /// The row segments between the home sequence and the final cursor move.
    fn segments(frame: &[u8]) -> Vec<Vec<u8>> {
        let body = frame
            .strip_prefix(b"\x1b[?25l\x1b[H")
            .expect("frame starts by hiding the cursor and going home");
        let end = body
            .windows(3)
            .rposition(|w| w == b"\x1b[K")
            .expect("frame has at least one row")
            + 3;
        body[..end]
            .split(|&b| b == b'\n')
            .map(|seg| {
                let seg = seg.strip_suffix(b"\r").unwrap_or(seg);
                seg.strip_suffix(b"\x1b[K")
                    .expect("every row ends with erase-line")
                    .to_vec()
            })
            .collect()
    }

    // -- Frame shape --------------------------------------------------------

    #[test]
    fn small_empty_screen() {
        let out = render(Size { rows: 2, cols: 5 }, Cursor::new(), &NoRows);
        // rows / 3 == 0, so the banner takes row 0.
        assert_eq!(
            out,
            b"\x1b[?25l\x1b[HGiga \x1b[K\r\n~\x1b[K\x1b[1;1H\x1b[?25h".to_vec()
        );
    }

    #[test]
    fn cursor_is_placed_one_indexed() {
        let out = render(Size { rows: 3, cols: 10 }, Cursor::at(2, 4), &NoRows);
        assert!(out.ends_with(b"\x1b[3;5H\x1b[?25h"));
    }

    #[test]
    fn no_line_break_after_last_row() {
        let out = render(Size { rows: 4, cols: 10 }, Cursor::new(), &NoRows);
        assert_eq!(out.windows(2).filter(|w| w == b"\r\n").count(), 3);
        assert!(!out.ends_with(b"\r\n"));
    }

    // -- Placeholders and banner --------------------------------------------

    #[test]
    fn banner_centered_on_third_row() {
        let size = Size { rows: 24, cols: 80 };
        let rows = segments(&render(size, Cursor::new(), &NoRows));

        assert_eq!(rows.len(), 24);
        let banner = &rows[8];
        let pad = (80 - BANNER.len()) / 2;
        assert_eq!(banner[0], b'~');
        assert!(banner[1..pad].iter().all(|&b| b == b' '));
        assert_eq!(&banner[pad..], BANNER.as_bytes());
        for (i, row) in rows.iter().enumerate() {
            if i != 8 {
                assert_eq!(row, b"~", "row {i}");
            }
        }
    }

    #[test]
    fn banner_truncated_to_width() {
        let rows = segments(&render(Size { rows: 3, cols: 4 }, Cursor::new(), &NoRows));
        assert_eq!(rows[1], b"Giga");
    }

    #[test]
    fn zero_width_screen_writes_no_content() {
        let rows = segments(&render(Size { rows: 3, cols: 0 }, Cursor::new(), &NoRows));
        assert_eq!(rows, vec![Vec::<u8>::new(); 3]);
    }

    // -- Real content -------------------------------------------------------

    #[test]
    fn content_rows_replace_placeholders() {
        let text: &[&[u8]] = &[b"first", b"second line is long"];
        let rows = segments(&render(Size { rows: 4, cols: 10 }, Cursor::new(), text));
        assert_eq!(
            rows,
            vec![
                b"first".to_vec(),
                b"second lin".to_vec(),
                b"~".to_vec(),
                b"~".to_vec(),
            ]
        );
    }

    #[test]
    fn content_on_banner_row_suppresses_banner() {
        let text: &[&[u8]] = &[b"a", b"b", b"c", b"d"];
        let out = render(Size { rows: 3, cols: 40 }, Cursor::new(), text);
        assert!(!out.windows(4).any(|w| w == b"Giga"));
    }

    #[test]
    fn slice_source_returns_rows() {
        let text: &[&[u8]] = &[b"x"];
        assert_eq!(text.row(0), Some(&b"x"[..]));
        assert_eq!(text.row(1), None);
        assert_eq!(NoRows.row(0), None);
    }

    // -- Properties ---------------------------------------------------------

    proptest! {
        #[test]
        fn emits_exactly_rows_segments_within_width(
            rows in 1u16..80,
            cols in 0u16..200,
            content in prop::collection::vec(
                prop::collection::vec(0x20u8..0x7F, 0..300),
                0..100,
            ),
        ) {
            let borrowed: Vec<&[u8]> = content.iter().map(Vec::as_slice).collect();
            let out = render(Size { rows, cols }, Cursor::new(), borrowed.as_slice());
            let segs = segments(&out);

            prop_assert_eq!(segs.len(), usize::from(rows));
            for seg in &segs {
                prop_assert!(seg.len() <= usize::from(cols));
            }
        }
    }
}
