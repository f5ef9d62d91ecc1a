//! End-to-end sessions: `Editor` driven by `run` against a fake terminal.

use std::io;

use giga_editor::Editor;
use giga_term::{Device, LoopConfig, Size, TerminalError, exit_code, run};

/// A terminal that never was: scripted input, recorded output, counters.
struct FakeDevice {
    input: &'static [u8],
    output: CountingSink,
    size: Size,
    enable_fails: bool,
    enables: usize,
    disables: usize,
}

impl FakeDevice {
    fn new(size: Size, input: &'static [u8]) -> Self {
        Self {
            input,
            output: CountingSink::default(),
            size,
            enable_fails: false,
            enables: 0,
            disables: 0,
        }
    }
}

impl Device for FakeDevice {
    type Input = &'static [u8];
    type Output = CountingSink;

    fn enable_raw_mode(&mut self) -> Result<(), TerminalError> {
        self.enables += 1;
        if self.enable_fails {
            return Err(TerminalError::GetAttributes(io::Error::new(
                io::ErrorKind::Unsupported,
                "not a terminal",
            )));
        }
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> Result<(), TerminalError> {
        self.disables += 1;
        Ok(())
    }

    fn query_size(&mut self) -> Option<Size> {
        Some(self.size)
    }

    fn streams(&mut self) -> (&mut &'static [u8], &mut CountingSink) {
        (&mut self.input, &mut self.output)
    }
}

/// Output sink that counts flushes. The loop flushes once per frame.
#[derive(Default)]
struct CountingSink {
    bytes: Vec<u8>,
    flushes: usize,
}

impl io::Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

fn session(device: &mut FakeDevice) -> (u8, String) {
    let config = LoopConfig::default();
    let mut editor = Editor::from_config(&config);
    let result = run(device, &mut editor, &config);
    let mut stderr = Vec::new();
    let code = exit_code(&result, "giga", &mut stderr);
    (code, String::from_utf8(stderr).unwrap())
}

#[test]
fn immediate_quit_renders_one_frame_and_restores_once() {
    let mut device = FakeDevice::new(Size { rows: 24, cols: 80 }, b"\x11");

    let (code, stderr) = session(&mut device);

    assert_eq!(code, 0);
    assert_eq!(stderr, "");
    assert_eq!(device.output.flushes, 1);
    assert_eq!(device.enables, 1);
    assert_eq!(device.disables, 1);

    let frame = &device.output.bytes;
    assert!(frame.starts_with(b"\x1b[?25l\x1b[H"));
    assert!(frame.ends_with(b"\x1b[1;1H\x1b[?25h"));
    assert_eq!(frame.windows(3).filter(|w| w == b"\x1b[K").count(), 24);
}

#[test]
fn enable_failure_exits_one_without_rendering_or_restoring() {
    let mut device = FakeDevice::new(Size { rows: 24, cols: 80 }, b"\x11");
    device.enable_fails = true;

    let (code, stderr) = session(&mut device);

    assert_eq!(code, 1);
    assert_eq!(stderr, "giga: cannot read terminal attributes: not a terminal\n");
    assert_eq!(device.output.flushes, 0);
    assert!(device.output.bytes.is_empty());
    assert_eq!(device.disables, 0);
}

#[test]
fn movement_keys_reach_the_cursor() {
    // Down, Down, Right, End, then quit.
    let mut device = FakeDevice::new(
        Size { rows: 10, cols: 20 },
        b"\x1b[B\x1b[B\x1b[C\x1b[F\x11",
    );

    let (code, _) = session(&mut device);

    assert_eq!(code, 0);
    assert_eq!(device.output.flushes, 5);
    assert!(device.output.bytes.ends_with(b"\x1b[3;20H\x1b[?25h"));
}

#[test]
fn closed_input_is_fatal_but_restores() {
    let mut device = FakeDevice::new(Size { rows: 5, cols: 20 }, b"ab");

    let (code, stderr) = session(&mut device);

    assert_eq!(code, 1);
    assert!(stderr.starts_with("giga: terminal i/o failed:"));
    assert_eq!(device.disables, 1);
}
