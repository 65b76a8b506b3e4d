use std::io::{self, IsTerminal, Write};
use clap::Args;

use crate::cli_util::print_debug_error;
use crate::debugger::console::{Console, StdinConsole};
use crate::debugger::{command_loop, Debugger};
use crate::repl::{select_mode, EditorConsole, ModeFlagOverride, ReplMode, PROMPT};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct DebugArgs {
    /// Program to debug (same as the `file` command)
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

// Public entry point for the debugger from main.rs
pub fn run(program: &str, args: DebugArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let flag = if args.bare {
        ModeFlagOverride::Bare
    } else if args.editor {
        ModeFlagOverride::Editor
    } else {
        ModeFlagOverride::None
    };

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match select_mode(flag) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let mut console: Box<dyn Console> = match mode {
        ReplMode::Editor => match EditorConsole::new() {
            Ok(editor) => Box::new(editor),
            Err(e) => {
                eprintln!("{program}: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        },
        ReplMode::Bare => Box::new(StdinConsole::new(false)),
    };

    // Print banners only if stderr is a TTY
    if io::stderr().is_terminal() {
        eprintln!("bfdbg debugger for Brainfuck.");
        eprintln!("Commands are similar to gdb, type \"help\" for a list of compatible commands.");
        let _ = io::stderr().flush();
    }

    let mut debugger = Debugger::new(io::stdout());
    if let Some(path) = args.file {
        debugger.set_program(path);
    }

    match command_loop(&mut debugger, console.as_mut(), PROMPT) {
        Ok(()) => 0,
        Err(err) => {
            tracing::debug!(error = %err, "debugging session aborted");
            print_debug_error(Some(program), debugger.program_path(), &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} debug [FILE]   # Start the interactive debugger, optionally presetting the program

Options:
  --help,   -h        Show this help
  --bare              Force non-interactive bare mode
  --editor            Force interactive editor mode (errors if stdin is not a TTY)

Description:
  Commands are similar to gdb; type "help" at the prompt for the full list.
  Breakpoints are program positions (instruction indexes, comments excluded).
  Watchpoints are memory positions relative to where the pointer starts.

Notes:
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: BFDBG_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
        * Banners are suppressed if stderr is not a TTY.
    - Ctrl+D at the prompt (or end of input) leaves the debugger.
    - Ctrl+C exits immediately, even while the program is running.
    - Settings are read from bfdbg.toml in your config directory ([colors], [history]).
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
