use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

use crate::program::read_source;
use crate::{DebugError, LoadError, MachineError};

/// Initialize logging to stderr.
///
/// Use the `RUST_LOG` environment variable to override the default `warn` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Pretty-print a load error, with a caret under the offending source byte
/// when there is one.
/// If `program` is `Some("bfdbg")`, prefix messages with "bfdbg: ...".
pub fn print_load_error(program: Option<&str>, source: &[u8], err: &LoadError) {
    match err {
        LoadError::UnmatchedBracket { index, offset, kind } => {
            let msg = prefixed(program, &format!("Parse error: unmatched bracket {kind}"));
            eprintln!("{msg} at instruction {index}");
            print_context(source, *offset);
        }
        LoadError::Io { .. } => {
            eprintln!("{}", prefixed(program, &err.to_string()));
        }
    }
    let _ = io::stderr().flush();
}

/// Print a runtime fault concisely.
pub fn print_machine_error(program: Option<&str>, err: &MachineError) {
    let msg = match err {
        MachineError::PointerOutOfBounds { pc, pointer, op } => format!(
            "Runtime error: pointer out of bounds (pointer={pointer}, op={op}) at instruction {pc}"
        ),
        MachineError::StepLimitExceeded { .. } => err.to_string(),
        other => format!("Runtime error: {other}"),
    };
    eprintln!("{}", prefixed(program, &msg));
    let _ = io::stderr().flush();
}

/// Print a fatal debugger fault. Load faults re-read `path` for caret context.
pub fn print_debug_error(program: Option<&str>, path: Option<&Path>, err: &DebugError) {
    match err {
        DebugError::Load(inner) => {
            let source = path.and_then(|p| read_source(p).ok()).unwrap_or_default();
            print_load_error(program, &source, inner);
            return;
        }
        DebugError::Machine(inner) => print_machine_error(program, inner),
        other => eprintln!("{}", prefixed(program, &other.to_string())),
    }
    let _ = io::stderr().flush();
}

fn prefixed(program: Option<&str>, msg: &str) -> String {
    match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg.to_string(),
    }
}

/// Print a short window of `source` around byte `pos` with a caret under it.
/// Control bytes are shown as spaces so the caret lines up.
pub fn print_context(source: &[u8], pos: usize) {
    // Show a short window around the position for context
    const WINDOW: usize = 32;

    let start = pos.saturating_sub(WINDOW);
    let end = (pos + WINDOW + 1).min(source.len());
    if start >= end {
        return;
    }

    let slice: String = source[start..end]
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { ' ' })
        .collect();
    eprintln!("  {}", slice);

    // Caret under the exact position
    let underline = format!("{}^", " ".repeat(pos - start));
    eprintln!("  {}", underline);
}
