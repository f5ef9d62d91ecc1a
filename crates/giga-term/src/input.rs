// SPDX-License-Identifier: MIT
//
// Terminal key decoder.
//
// Turns raw stdin bytes into logical key events, one event per call:
//
// - Plain bytes: printable or control
// - CSI sequences: `ESC [ A..D` arrows, `ESC [ H/F` home/end,
//   `ESC [ <digit> ~` editing keys
// - SS3 sequences: `ESC O H/F` home/end
// - A bare `ESC` with nothing behind it
//
// # Design
//
// The decoder is an explicit state machine. Each state reads at most one
// byte and either emits an event or moves to the next state; `step` is the
// whole transition table. Nothing survives between `next_key` calls, so a
// broken sequence can never poison the next keypress.
//
// # Escape vs escape-sequence ambiguity
//
// A bare `ESC` byte (0x1B) could be either a standalone Escape keypress
// or the start of a multi-byte escape sequence. Only the first byte of a
// key is read with a blocking wait; every continuation byte is read with a
// short bounded wait. If it does not arrive in time, whatever has been
// seen so far resolves to `Escape`.

use std::io;
use std::time::Duration;

/// The escape byte that opens every multi-byte key sequence.
pub const ESC: u8 = 0x1B;

/// Default wait for a continuation byte after `ESC`.
///
/// Terminals send a whole sequence in one write, so the follow-up bytes are
/// normally already buffered. 25 ms is long enough for a slow SSH link and
/// short enough that a real Escape press feels immediate.
pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(25);

// ─── Event Types ────────────────────────────────────────────────────────────

/// Arrow-key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// A non-control byte, passed through as-is (no UTF-8 decoding).
    Printable(u8),
    /// A control byte: C0 (`0x00..=0x1F`), DEL (`0x7F`), or C1 (`0x80..=0x9F`).
    Control(u8),
    /// An arrow key.
    Arrow(Direction),
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    /// A bare `ESC`, or any sequence the decoder does not recognise.
    Escape,
    /// The input stream is closed.
    Eof,
}

impl KeyEvent {
    /// Classify a single byte that is not the start of a sequence.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00..=0x1F | 0x7F..=0x9F => Self::Control(byte),
            _ => Self::Printable(byte),
        }
    }
}

/// The control byte produced by holding Ctrl with `letter`.
///
/// Ctrl strips the top three bits: `ctrl(b'q') == 0x11`. Works for either
/// case of the letter.
#[must_use]
pub const fn ctrl(letter: u8) -> u8 {
    letter & 0x1F
}

// ─── Byte Sources ───────────────────────────────────────────────────────────

/// Where the decoder gets its bytes.
///
/// Two read flavours: a blocking read for the first byte of a key, and a
/// bounded read for continuation bytes. Both return `Ok(None)` when no byte
/// is available: end of stream for the blocking read, end of stream or an
/// expired wait for the bounded one.
pub trait ByteSource {
    /// Block until one byte arrives. `Ok(None)` means end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying read fault.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Wait at most `timeout` for one byte.
    ///
    /// # Errors
    ///
    /// Returns the underlying read fault.
    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>>;
}

/// A byte slice is a source whose bytes are all "already arrived".
///
/// Reading advances the slice, so the remaining length shows exactly how
/// much the decoder consumed.
impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let Some((&byte, rest)) = self.split_first() else {
            return Ok(None);
        };
        *self = rest;
        Ok(Some(byte))
    }

    fn read_byte_timeout(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
        self.read_byte()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        (**self).read_byte_timeout(timeout)
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Decoder state while resolving one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing read yet.
    Idle,
    /// Read `ESC`.
    SeqStart,
    /// Read `ESC [`.
    Bracket,
    /// Read `ESC [ <digit>`; holds the digit.
    BracketDigit(u8),
    /// Read `ESC O`.
    Ss3,
}

/// Outcome of one transition.
enum Step {
    Emit(KeyEvent),
    Next(State),
}

/// Decodes bytes from a [`ByteSource`] into [`KeyEvent`]s.
///
/// # Example
///
/// ```
/// use giga_term::input::{Direction, KeyDecoder, KeyEvent};
///
/// let decoder = KeyDecoder::new();
/// let mut bytes: &[u8] = b"\x1b[Ax";
///
/// assert_eq!(decoder.next_key(&mut bytes)?, KeyEvent::Arrow(Direction::Up));
/// assert_eq!(decoder.next_key(&mut bytes)?, KeyEvent::Printable(b'x'));
/// assert_eq!(decoder.next_key(&mut bytes)?, KeyEvent::Eof);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct KeyDecoder {
    escape_timeout: Duration,
}

impl KeyDecoder {
    /// Decoder with [`DEFAULT_ESCAPE_TIMEOUT`].
    #[must_use]
    pub const fn new() -> Self {
        Self::with_timeout(DEFAULT_ESCAPE_TIMEOUT)
    }

    /// Decoder with a custom continuation-byte wait.
    #[must_use]
    pub const fn with_timeout(escape_timeout: Duration) -> Self {
        Self { escape_timeout }
    }

    /// The continuation-byte wait in use.
    #[inline]
    #[must_use]
    pub const fn escape_timeout(&self) -> Duration {
        self.escape_timeout
    }

    /// Read exactly one key from `source`.
    ///
    /// Blocks for the first byte only. Returns [`KeyEvent::Eof`] when the
    /// stream ends before a key starts.
    ///
    /// # Errors
    ///
    /// Returns the read fault of `source`.
    pub fn next_key(&self, source: &mut impl ByteSource) -> io::Result<KeyEvent> {
        let mut state = State::Idle;
        loop {
            let byte = if state == State::Idle {
                source.read_byte()?
            } else {
                source.read_byte_timeout(self.escape_timeout)?
            };
            match step(state, byte) {
                Step::Emit(key) => return Ok(key),
                Step::Next(next) => state = next,
            }
        }
    }

    /// Lazily decode keys until the stream ends.
    ///
    /// The iterator yields [`KeyEvent::Eof`] once and then stops; calling
    /// `keys` again resumes from wherever `source` is.
    pub fn keys<'a, S: ByteSource>(&'a self, source: &'a mut S) -> Keys<'a, S> {
        Keys {
            decoder: self,
            source,
            done: false,
        }
    }
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// The transition table.
///
/// `byte` is `None` when the read came back empty: end of stream in
/// `Idle`, an expired wait anywhere else.
const fn step(state: State, byte: Option<u8>) -> Step {
    match (state, byte) {
        (State::Idle, None) => Step::Emit(KeyEvent::Eof),
        (State::Idle, Some(ESC)) => Step::Next(State::SeqStart),
        (State::Idle, Some(b)) => Step::Emit(KeyEvent::from_byte(b)),

        (State::SeqStart, Some(b'[')) => Step::Next(State::Bracket),
        (State::SeqStart, Some(b'O')) => Step::Next(State::Ss3),

        (State::Bracket, Some(b'A')) => Step::Emit(KeyEvent::Arrow(Direction::Up)),
        (State::Bracket, Some(b'B')) => Step::Emit(KeyEvent::Arrow(Direction::Down)),
        (State::Bracket, Some(b'C')) => Step::Emit(KeyEvent::Arrow(Direction::Right)),
        (State::Bracket, Some(b'D')) => Step::Emit(KeyEvent::Arrow(Direction::Left)),
        (State::Bracket, Some(b'H')) => Step::Emit(KeyEvent::Home),
        (State::Bracket, Some(b'F')) => Step::Emit(KeyEvent::End),
        (State::Bracket, Some(d @ b'0'..=b'9')) => Step::Next(State::BracketDigit(d)),

        (State::BracketDigit(d), Some(b'~')) => Step::Emit(match d {
            b'1' | b'7' => KeyEvent::Home,
            b'3' => KeyEvent::Delete,
            b'4' | b'8' => KeyEvent::End,
            b'5' => KeyEvent::PageUp,
            b'6' => KeyEvent::PageDown,
            _ => KeyEvent::Escape,
        }),

        (State::Ss3, Some(b'H')) => Step::Emit(KeyEvent::Home),
        (State::Ss3, Some(b'F')) => Step::Emit(KeyEvent::End),

        // Timed out mid-sequence, or a byte that fits nowhere.
        _ => Step::Emit(KeyEvent::Escape),
    }
}

/// Iterator returned by [`KeyDecoder::keys`].
pub struct Keys<'a, S> {
    decoder: &'a KeyDecoder,
    source: &'a mut S,
    done: bool,
}

impl<S: ByteSource> Iterator for Keys<'_, S> {
    type Item = io::Result<KeyEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let key = self.decoder.next_key(&mut *self.source);
        if matches!(key, Ok(KeyEvent::Eof) | Err(_)) {
            self.done = true;
        }
        Some(key)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: decode one key and report how many bytes it consumed.
    fn decode(data: &[u8]) -> (KeyEvent, usize) {
        let mut source = data;
        let key = KeyDecoder::new().next_key(&mut source).unwrap();
        (key, data.len() - source.len())
    }

    /// Helper: decode every key in `data`, excluding the final Eof.
    fn decode_all(data: &[u8]) -> Vec<KeyEvent> {
        let mut source = data;
        let decoder = KeyDecoder::new();
        let mut keys: Vec<KeyEvent> = decoder
            .keys(&mut source)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(keys.pop(), Some(KeyEvent::Eof));
        keys
    }

    /// Source that delivers some bytes, then times out on every bounded read.
    struct Stalled<'a> {
        bytes: &'a [u8],
        timeouts: usize,
    }

    impl ByteSource for Stalled<'_> {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            self.bytes.read_byte()
        }

        fn read_byte_timeout(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
            self.timeouts += 1;
            Ok(None)
        }
    }

    struct Faulty;

    impl ByteSource for Faulty {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Err(io::Error::from(io::ErrorKind::Other))
        }

        fn read_byte_timeout(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
            Err(io::Error::from(io::ErrorKind::Other))
        }
    }

    // ── Single bytes ────────────────────────────────────────────────────

    #[test]
    fn printable_ascii() {
        assert_eq!(decode(b"a"), (KeyEvent::Printable(b'a'), 1));
        assert_eq!(decode(b" "), (KeyEvent::Printable(b' '), 1));
        assert_eq!(decode(b"~"), (KeyEvent::Printable(b'~'), 1));
    }

    #[test]
    fn c1_bytes_are_control() {
        assert_eq!(decode(&[0x80]), (KeyEvent::Control(0x80), 1));
        assert_eq!(decode(&[0x85]), (KeyEvent::Control(0x85), 1));
        assert_eq!(decode(&[0x9F]), (KeyEvent::Control(0x9F), 1));
    }

    #[test]
    fn bytes_above_c1_are_printable() {
        assert_eq!(decode(&[0xA0]), (KeyEvent::Printable(0xA0), 1));
        assert_eq!(decode(&[0xC3]), (KeyEvent::Printable(0xC3), 1));
        assert_eq!(decode(&[0xFF]), (KeyEvent::Printable(0xFF), 1));
    }

    #[test]
    fn control_bytes() {
        assert_eq!(decode(&[0x00]), (KeyEvent::Control(0x00), 1));
        assert_eq!(decode(b"\r"), (KeyEvent::Control(b'\r'), 1));
        assert_eq!(decode(&[0x11]), (KeyEvent::Control(0x11), 1));
        assert_eq!(decode(&[0x1F]), (KeyEvent::Control(0x1F), 1));
    }

    #[test]
    fn del_is_control() {
        assert_eq!(decode(&[0x7F]), (KeyEvent::Control(0x7F), 1));
    }

    #[test]
    fn ctrl_helper() {
        assert_eq!(ctrl(b'q'), 0x11);
        assert_eq!(ctrl(b'Q'), 0x11);
        assert_eq!(ctrl(b'a'), 0x01);
    }

    #[test]
    fn empty_stream_is_eof() {
        assert_eq!(decode(b""), (KeyEvent::Eof, 0));
    }

    #[test]
    fn read_fault_propagates() {
        assert!(KeyDecoder::new().next_key(&mut Faulty).is_err());
    }

    // ── Arrows ──────────────────────────────────────────────────────────

    #[test]
    fn arrows_consume_three_bytes() {
        assert_eq!(decode(b"\x1b[A"), (KeyEvent::Arrow(Direction::Up), 3));
        assert_eq!(decode(b"\x1b[B"), (KeyEvent::Arrow(Direction::Down), 3));
        assert_eq!(decode(b"\x1b[C"), (KeyEvent::Arrow(Direction::Right), 3));
        assert_eq!(decode(b"\x1b[D"), (KeyEvent::Arrow(Direction::Left), 3));
    }

    #[test]
    fn arrow_leaves_following_bytes() {
        assert_eq!(decode(b"\x1b[Axyz"), (KeyEvent::Arrow(Direction::Up), 3));
    }

    // ── Home / End ──────────────────────────────────────────────────────

    #[test]
    fn csi_home_end() {
        assert_eq!(decode(b"\x1b[H"), (KeyEvent::Home, 3));
        assert_eq!(decode(b"\x1b[F"), (KeyEvent::End, 3));
    }

    #[test]
    fn ss3_home_end() {
        assert_eq!(decode(b"\x1bOH"), (KeyEvent::Home, 3));
        assert_eq!(decode(b"\x1bOF"), (KeyEvent::End, 3));
    }

    #[test]
    fn ss3_unknown_is_escape() {
        assert_eq!(decode(b"\x1bOP"), (KeyEvent::Escape, 3));
    }

    // ── Tilde sequences ─────────────────────────────────────────────────

    #[test]
    fn tilde_keys_consume_four_bytes() {
        assert_eq!(decode(b"\x1b[1~"), (KeyEvent::Home, 4));
        assert_eq!(decode(b"\x1b[3~"), (KeyEvent::Delete, 4));
        assert_eq!(decode(b"\x1b[4~"), (KeyEvent::End, 4));
        assert_eq!(decode(b"\x1b[5~"), (KeyEvent::PageUp, 4));
        assert_eq!(decode(b"\x1b[6~"), (KeyEvent::PageDown, 4));
        assert_eq!(decode(b"\x1b[7~"), (KeyEvent::Home, 4));
        assert_eq!(decode(b"\x1b[8~"), (KeyEvent::End, 4));
    }

    #[test]
    fn unmapped_tilde_digits_are_escape() {
        for digit in [b'0', b'2', b'9'] {
            let seq = [ESC, b'[', digit, b'~'];
            assert_eq!(decode(&seq), (KeyEvent::Escape, 4), "digit {}", digit as char);
        }
    }

    #[test]
    fn digit_without_tilde_is_escape() {
        assert_eq!(decode(b"\x1b[5x"), (KeyEvent::Escape, 4));
    }

    // ── Bare and broken escapes ─────────────────────────────────────────

    #[test]
    fn bare_escape_consumes_one_byte() {
        assert_eq!(decode(b"\x1b"), (KeyEvent::Escape, 1));
    }

    #[test]
    fn escape_then_other_byte() {
        assert_eq!(decode(b"\x1bx"), (KeyEvent::Escape, 2));
    }

    #[test]
    fn unknown_csi_final_is_escape() {
        assert_eq!(decode(b"\x1b[Z"), (KeyEvent::Escape, 3));
    }

    #[test]
    fn truncated_csi_is_escape() {
        assert_eq!(decode(b"\x1b["), (KeyEvent::Escape, 2));
        assert_eq!(decode(b"\x1b[5"), (KeyEvent::Escape, 3));
    }

    #[test]
    fn stalled_sequence_times_out_to_escape() {
        let mut source = Stalled {
            bytes: b"\x1b[A",
            timeouts: 0,
        };
        let key = KeyDecoder::new().next_key(&mut source).unwrap();
        assert_eq!(key, KeyEvent::Escape);
        // Only ESC came from the blocking read; the rest is still unread.
        assert_eq!(source.bytes, b"[A");
        assert_eq!(source.timeouts, 1);
    }

    #[test]
    fn blocking_read_only_for_first_byte() {
        let mut source = Stalled {
            bytes: b"q",
            timeouts: 0,
        };
        let key = KeyDecoder::new().next_key(&mut source).unwrap();
        assert_eq!(key, KeyEvent::Printable(b'q'));
        assert_eq!(source.timeouts, 0);
    }

    // ── Streams ─────────────────────────────────────────────────────────

    #[test]
    fn mixed_stream() {
        assert_eq!(
            decode_all(b"a\x1b[B\x1b[6~\x11\x1bOF"),
            vec![
                KeyEvent::Printable(b'a'),
                KeyEvent::Arrow(Direction::Down),
                KeyEvent::PageDown,
                KeyEvent::Control(0x11),
                KeyEvent::End,
            ]
        );
    }

    #[test]
    fn no_state_survives_a_broken_sequence() {
        assert_eq!(
            decode_all(b"\x1b[9~\x1b[A"),
            vec![KeyEvent::Escape, KeyEvent::Arrow(Direction::Up)]
        );
    }

    #[test]
    fn keys_is_restartable() {
        let decoder = KeyDecoder::new();
        let mut source: &[u8] = b"ab";

        let first = decoder.keys(&mut source).next().unwrap().unwrap();
        assert_eq!(first, KeyEvent::Printable(b'a'));

        let rest: Vec<_> = decoder.keys(&mut source).map(Result::unwrap).collect();
        assert_eq!(rest, vec![KeyEvent::Printable(b'b'), KeyEvent::Eof]);
    }

    #[test]
    fn keys_stops_after_error() {
        let decoder = KeyDecoder::new();
        let mut source = Faulty;
        let mut keys = decoder.keys(&mut source);
        assert!(keys.next().unwrap().is_err());
        assert!(keys.next().is_none());
    }

    #[test]
    fn custom_timeout_is_kept() {
        let decoder = KeyDecoder::with_timeout(Duration::from_millis(5));
        assert_eq!(decoder.escape_timeout(), Duration::from_millis(5));
        assert_eq!(KeyDecoder::default().escape_timeout(), DEFAULT_ESCAPE_TIMEOUT);
    }
}
