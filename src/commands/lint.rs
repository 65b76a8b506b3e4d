use clap::Args;
use std::io::{self, Write};

use crate::cli_util::print_load_error;
use crate::program::{read_source, Program};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct LintArgs {
    /// Brainfuck program to canonicalize
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: LintArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }
    let Some(path) = args.file else {
        usage_and_exit(program, 2);
    };

    let source = match read_source(&path) {
        Ok(source) => source,
        Err(err) => {
            print_load_error(Some(program), &[], &err);
            return 1;
        }
    };
    match Program::parse(&source) {
        Ok(parsed) => {
            println!("{parsed}");
            let _ = io::stdout().flush();
            0
        }
        Err(err) => {
            print_load_error(Some(program), &source, &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} lint <FILE>

Description:
  Prints the program with every non-instruction character removed, then exits
  without executing it. Unbalanced brackets are reported as errors.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
