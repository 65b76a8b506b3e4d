use bfdbg::cli_util;
use bfdbg::commands::{debug, lint, run};
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, Write};

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run   <FILE> [--max-steps N]   # Run a Brainfuck program to completion
  {0} lint  <FILE>                   # Print the program without comments and exit
  {0} debug [FILE] [--bare|--editor] # Start the interactive debugger

Run "{0} <subcommand> --help" for more info.
Set RUST_LOG (e.g. RUST_LOG=debug) to see diagnostic logs on stderr.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bfdbg", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(run::RunArgs),
    Lint(lint::LintArgs),
    Debug(debug::DebugArgs),
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bfdbg"));

    cli_util::init_logging();

    let cli = Cli::parse();

    let Some(command) = cli.command.filter(|_| !cli.help) else {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    };

    let code = match command {
        Command::Run(args) => run::run(&program, args),
        Command::Lint(args) => lint::run(&program, args),
        Command::Debug(args) => debug::run(&program, args),
    };

    std::process::exit(code);
}
