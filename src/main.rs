// SPDX-License-Identifier: MIT
//
// giga: a minimal raw-mode terminal screen editor.
//
// This is the binary that wires the two crates together:
//
//   giga-term   → raw mode, size probe, key decoding, event loop
//   giga-editor → cursor, screen rendering, key dispatch
//
// Each keypress flows through:
//
//   stdin → KeyDecoder → Editor::on_key → cursor movement
//   Editor::paint → render_frame → OutputBuffer → one write to stdout
//
// Logging goes to the file named by GIGA_LOG, never to the terminal the
// editor is drawing on. Without GIGA_LOG nothing is logged.

use std::env;
use std::fs::File;
use std::io;
use std::process::ExitCode;
use std::sync::Mutex;

use giga_editor::Editor;
use giga_term::{LoopConfig, Tty, exit_code, run};
use tracing_subscriber::EnvFilter;

/// Env var naming the log file.
const LOG_ENV: &str = "GIGA_LOG";

fn main() -> ExitCode {
    init_logging();

    let config = LoopConfig::from_env();
    tracing::debug!(?config, "starting");

    let mut tty = Tty::new();
    let mut editor = Editor::from_config(&config);
    let result = run(&mut tty, &mut editor, &config);

    if let Err(e) = &result {
        tracing::error!(error = %e, "session ended with an error");
    }
    ExitCode::from(exit_code(&result, "giga", &mut io::stderr().lock()))
}

/// Install a file-backed subscriber if `GIGA_LOG` is set.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. A log file that
/// cannot be created is reported once on stderr and logging stays off.
fn init_logging() {
    let Some(path) = env::var_os(LOG_ENV) else {
        return;
    };

    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("giga: cannot open log file {}: {e}", path.to_string_lossy());
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if let Err(e) = installed {
        eprintln!("giga: cannot install logger: {e}");
    }
}
