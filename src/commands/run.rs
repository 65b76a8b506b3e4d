use clap::Args;
use std::io::{self, Write};

use crate::Machine;
use crate::cli_util::{print_load_error, print_machine_error};
use crate::program::{read_source, Program};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Brainfuck program to execute
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Maximum interpreter steps before abort (fallback BFDBG_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs { file, max_steps, .. } = args;
    let Some(path) = file else {
        usage_and_exit(program, 2);
    };

    let source = match read_source(&path) {
        Ok(source) => source,
        Err(err) => {
            print_load_error(Some(program), &[], &err);
            return 1;
        }
    };
    let parsed = match Program::parse(&source) {
        Ok(parsed) => parsed,
        Err(err) => {
            print_load_error(Some(program), &source, &err);
            return 1;
        }
    };

    // Resolve limits: flag -> env -> unlimited
    let max_steps = max_steps
        .or_else(|| std::env::var("BFDBG_MAX_STEPS").ok().and_then(|s| s.parse::<u64>().ok()));

    let mut machine = Machine::new();
    machine.install(parsed);
    let result = machine.run_with_limit(max_steps);
    let _ = io::stdout().flush();

    match result {
        Ok(()) => 0,
        Err(err) => {
            print_machine_error(Some(program), &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run <FILE> [--max-steps N]

Options:
  --max-steps <N>  Abort after N instructions (fallback BFDBG_MAX_STEPS)
  --help,  -h      Show this help

Notes:
- Characters outside of Brainfuck's ><+-.,[] are ignored.
- Input (`,`) reads a single byte from stdin; on EOF the current cell is left unchanged.
- The tape holds 5000 cells; moving the pointer off either end is an error.

Examples:
- Read bytes from a file as stdin (`,` will consume file input):
    {0} run rot13.bf < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
