//! The debugger's command table and the rules for dispatching a line to it.
//!
//! The table is fixed at compile time. Each entry names its aliases, a usage
//! label for the argument list, the minimum number of arguments and whether a
//! program must be running. Resolution checks those preconditions so handlers
//! only ever see well-formed invocations.

use std::fmt::Write as _;

/// Every command the debugger understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Run,
    Print,
    Next,
    Jump,
    Break,
    Clear,
    Watch,
    Delete,
    Continue,
    Info,
    Kill,
    File,
    Quit,
}

/// One row of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub command: Command,
    pub names: &'static [&'static str],
    pub args: &'static str,
    pub min_args: usize,
    pub requires_running: bool,
    pub description: &'static str,
}

impl CommandSpec {
    /// The long name, used in usage messages.
    pub fn name(&self) -> &'static str {
        self.names.last().copied().unwrap_or_default()
    }

    pub fn usage(&self) -> String {
        if self.args.is_empty() {
            self.name().to_string()
        } else {
            format!("{} {}", self.name(), self.args)
        }
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: Command::Run,
        names: &["r", "run"],
        args: "",
        min_args: 0,
        requires_running: false,
        description: "Run the program from the beginning",
    },
    CommandSpec {
        command: Command::Print,
        names: &["p", "print"],
        args: "<pos>",
        min_args: 1,
        requires_running: true,
        description: "Print value at memory position",
    },
    CommandSpec {
        command: Command::Next,
        names: &["n", "next"],
        args: "[count]",
        min_args: 0,
        requires_running: true,
        description: "Execute next instruction[s], ignoring breakpoints and watchpoints",
    },
    CommandSpec {
        command: Command::Jump,
        names: &["j", "jump"],
        args: "<pos>",
        min_args: 1,
        requires_running: true,
        description: "Jump to a program position and continue",
    },
    CommandSpec {
        command: Command::Break,
        names: &["b", "break"],
        args: "<pos>",
        min_args: 1,
        requires_running: false,
        description: "Add breakpoint at program position",
    },
    CommandSpec {
        command: Command::Clear,
        names: &["cl", "clear"],
        args: "<pos>",
        min_args: 1,
        requires_running: false,
        description: "Delete breakpoint at program position",
    },
    CommandSpec {
        command: Command::Watch,
        names: &["w", "watch"],
        args: "<addr> <op> <value>",
        min_args: 1,
        requires_running: false,
        description: "Stop when the cell at memory position addr satisfies op (=, !=, >, <, >=, <=)",
    },
    CommandSpec {
        command: Command::Delete,
        names: &["d", "delete"],
        args: "<addr>",
        min_args: 1,
        requires_running: false,
        description: "Delete watchpoint at memory position",
    },
    CommandSpec {
        command: Command::Continue,
        names: &["c", "cont", "continue"],
        args: "",
        min_args: 0,
        requires_running: true,
        description: "Continue until a breakpoint, a watchpoint or the end",
    },
    CommandSpec {
        command: Command::Info,
        names: &["i", "info"],
        args: "",
        min_args: 0,
        requires_running: false,
        description: "Show session state, breakpoints and watchpoints",
    },
    CommandSpec {
        command: Command::Kill,
        names: &["kill"],
        args: "",
        min_args: 0,
        requires_running: true,
        description: "Kill program execution",
    },
    CommandSpec {
        command: Command::File,
        names: &["f", "file"],
        args: "<path>",
        min_args: 1,
        requires_running: false,
        description: "Set the program file to debug",
    },
    CommandSpec {
        command: Command::Quit,
        names: &["q", "quit"],
        args: "",
        min_args: 0,
        requires_running: false,
        description: "Quit the debugger",
    },
];

const HELP_NAMES: &[&str] = &["h", "help"];

/// Find the command for `verb`. First match wins; case is ignored.
pub fn lookup(verb: &str) -> Option<&'static CommandSpec> {
    let verb = verb.to_ascii_lowercase();
    COMMANDS
        .iter()
        .find(|spec| spec.names.iter().any(|name| *name == verb))
}

pub fn is_help(verb: &str) -> bool {
    HELP_NAMES.iter().any(|name| verb.eq_ignore_ascii_case(name))
}

/// The `help` listing: one line per command with aliases, arguments and description.
pub fn help_text() -> String {
    let mut text = String::from("List of commands:\n\n");
    for spec in COMMANDS {
        let names = spec.names.join(", ");
        let _ = if spec.args.is_empty() {
            writeln!(text, "{names} -- {}", spec.description)
        } else {
            writeln!(text, "{names} {} -- {}", spec.args, spec.description)
        };
    }
    let _ = writeln!(text, "{} -- Show this list", HELP_NAMES.join(", "));
    text
}

/// Outcome of resolving one input line against the table.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch<'a> {
    /// Blank line.
    Empty,
    Help,
    Unknown(&'a str),
    NotRunning(&'static CommandSpec),
    MissingArgs(&'static CommandSpec),
    Invoke(&'static CommandSpec, Vec<&'a str>),
}

/// Split `line` on whitespace and validate it against the table.
pub fn resolve(line: &str, running: bool) -> Dispatch<'_> {
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Dispatch::Empty;
    };
    if is_help(verb) {
        return Dispatch::Help;
    }
    let Some(spec) = lookup(verb) else {
        return Dispatch::Unknown(verb);
    };
    if spec.requires_running && !running {
        return Dispatch::NotRunning(spec);
    }
    let args: Vec<&str> = tokens.collect();
    if args.len() < spec.min_args {
        return Dispatch::MissingArgs(spec);
    }
    Dispatch::Invoke(spec, args)
}

impl PartialEq for CommandSpec {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command
    }
}

impl Eq for CommandSpec {}
