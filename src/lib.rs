//! A Brainfuck interpreter with a gdb-style, step-granular debugger.
//!
//! The crate is split the way execution flows:
//! - [`program`] filters raw source down to the eight instructions and pairs
//!   loop brackets into a jump table.
//! - [`machine`] owns the tape and executes one instruction per step.
//! - [`debugger`] drives a machine under breakpoints and watchpoints and
//!   exposes the command set used at the `(bfdbg)` prompt.
//!
//! Quick start:
//!
//! ```no_run
//! use bfdbg::Machine;
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
//! let mut vm = Machine::from_source(code.as_bytes()).expect("balanced program");
//! vm.run().expect("program should run");
//! assert_eq!(vm.output(), b"Hello World!\n");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod debugger;
pub mod machine;
pub mod program;
pub mod repl;
pub mod theme;

pub use debugger::{DebugError, Debugger};
pub use machine::{Machine, MachineError, TAPE_SIZE};
pub use program::{BracketKind, Instruction, LoadError, Program};
