//! Interactive, step-granular debugging over a [`Machine`].
//!
//! A [`Debugger`] owns the program path, the breakpoint and watchpoint sets,
//! and (once `run` is issued) a fresh machine built from that path. Commands
//! arrive as text lines, are resolved against the table in [`commands`] and
//! reply with single lines written to the debugger's writer.
//!
//! Breakpoints stop execution *before* the instruction at their position runs.
//! Watchpoints are checked *after* every step while continuing; the lowest
//! matching address is reported. `next` ignores both.

pub mod commands;
pub mod console;
pub mod watch;

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::machine::{self, Machine, MachineError, TAPE_SIZE};
use crate::program::LoadError;
use commands::{Command, Dispatch};
use console::Console;
use watch::Condition;

/// Faults that end the debugging session.
#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What the command loop should do after a line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A watchpoint that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchHit {
    pub address: isize,
    pub value: i64,
    pub condition: Condition,
}

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotLoaded,
    Loaded,
    Running,
    AtBreakpoint(usize),
    AtWatchpoint(WatchHit),
    Ended,
}

impl SessionState {
    /// True while a machine is live (running or paused).
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SessionState::Running | SessionState::AtBreakpoint(_) | SessionState::AtWatchpoint(_)
        )
    }
}

/// A debugging session writing its replies to `W`.
pub struct Debugger<W: Write> {
    program_path: Option<PathBuf>,
    machine: Option<Machine>,
    state: SessionState,
    breakpoints: BTreeSet<usize>,
    watchpoints: BTreeMap<isize, Condition>,
    out: W,
}

impl<W: Write> Debugger<W> {
    pub fn new(out: W) -> Self {
        Self {
            program_path: None,
            machine: None,
            state: SessionState::NotLoaded,
            breakpoints: BTreeSet::new(),
            watchpoints: BTreeMap::new(),
            out,
        }
    }

    /// Record the program to run. Does not read the file.
    pub fn set_program(&mut self, path: impl Into<PathBuf>) {
        self.program_path = Some(path.into());
        if self.state == SessionState::NotLoaded {
            self.state = SessionState::Loaded;
        }
    }

    pub fn program_path(&self) -> Option<&Path> {
        self.program_path.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn machine(&self) -> Option<&Machine> {
        self.machine.as_ref()
    }

    pub fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    pub fn watchpoints(&self) -> &BTreeMap<isize, Condition> {
        &self.watchpoints
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Handle one command line.
    ///
    /// User mistakes are answered on the writer and return `Ok`; only load,
    /// addressing and I/O faults come back as errors.
    pub fn execute(&mut self, line: &str, console: &mut dyn Console) -> Result<Flow, DebugError> {
        match commands::resolve(line, self.is_running()) {
            Dispatch::Empty => {}
            Dispatch::Help => write!(self.out, "{}", commands::help_text())?,
            Dispatch::Unknown(verb) => {
                writeln!(self.out, "Undefined command: \"{verb}\".  Try \"help\".")?
            }
            Dispatch::NotRunning(_) => writeln!(self.out, "Program is not running!")?,
            Dispatch::MissingArgs(spec) => writeln!(
                self.out,
                "Not enough arguments for this command! Usage: {}",
                spec.usage()
            )?,
            Dispatch::Invoke(spec, args) => return self.invoke(spec.command, &args, console),
        }
        Ok(Flow::Continue)
    }

    fn invoke(
        &mut self,
        command: Command,
        args: &[&str],
        console: &mut dyn Console,
    ) -> Result<Flow, DebugError> {
        match command {
            Command::Run => self.run(console)?,
            Command::Print => self.print_cell(args[0])?,
            Command::Next => self.next(args.first().copied())?,
            Command::Jump => self.jump(args[0])?,
            Command::Break => self.set_breakpoint(args[0])?,
            Command::Clear => self.clear_breakpoint(args[0])?,
            Command::Watch => self.set_watchpoint(args)?,
            Command::Delete => self.delete_watchpoint(args[0])?,
            Command::Continue => self.resume(false)?,
            Command::Info => self.info()?,
            Command::Kill => self.kill()?,
            Command::File => self.file(args[0])?,
            Command::Quit => {
                if console.confirm("Are you sure you want to quit")? {
                    return Ok(Flow::Quit);
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn run(&mut self, console: &mut dyn Console) -> Result<(), DebugError> {
        if self.is_running()
            && !console.confirm(
                "Program is already running, do you want to start from the beginning",
            )?
        {
            return Ok(());
        }
        let Some(path) = self.program_path.clone() else {
            writeln!(self.out, "No program loaded! Load with `file <path>`")?;
            return Ok(());
        };

        writeln!(self.out, "Running program: {}", path.display())?;
        let machine = Machine::from_file(&path)?;
        tracing::debug!(path = %path.display(), "starting fresh machine");
        self.machine = Some(machine);
        self.state = SessionState::Running;
        self.resume(true)
    }

    /// Step until a breakpoint, a watchpoint or the end of the program.
    ///
    /// With `check_first` a breakpoint at the current position stops before
    /// anything runs; otherwise one instruction executes first so that
    /// resuming from a breakpoint makes progress.
    fn resume(&mut self, check_first: bool) -> Result<(), DebugError> {
        let Some(machine) = self.machine.as_mut() else {
            return Ok(());
        };

        if check_first && !machine.is_ended() && self.breakpoints.contains(&machine.program_counter())
        {
            let pc = machine.program_counter();
            return self.pause_at_breakpoint(pc);
        }

        loop {
            if !machine.step()? {
                return self.finish();
            }
            if let Some(hit) = first_watch_hit(machine, &self.watchpoints) {
                return self.pause_at_watchpoint(hit);
            }
            if machine.is_ended() {
                return self.finish();
            }
            let pc = machine.program_counter();
            if self.breakpoints.contains(&pc) {
                return self.pause_at_breakpoint(pc);
            }
        }
    }

    fn pause_at_breakpoint(&mut self, pc: usize) -> Result<(), DebugError> {
        tracing::debug!(pc, "paused at breakpoint");
        self.state = SessionState::AtBreakpoint(pc);
        self.newline_after_output()?;
        writeln!(self.out, "Breakpoint hit at position {pc}")?;
        Ok(())
    }

    fn pause_at_watchpoint(&mut self, hit: WatchHit) -> Result<(), DebugError> {
        tracing::debug!(address = hit.address, value = hit.value, "paused at watchpoint");
        self.state = SessionState::AtWatchpoint(hit);
        let pc = self.machine.as_ref().map_or(0, Machine::program_counter);
        self.newline_after_output()?;
        writeln!(
            self.out,
            "Watchpoint hit at position {pc}: ${} = {} ({})",
            hit.address, hit.value, hit.condition
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DebugError> {
        tracing::debug!("program exited");
        self.state = SessionState::Ended;
        self.newline_after_output()?;
        writeln!(self.out, "Program exited")?;
        Ok(())
    }

    // Keep replies at column 0 when the program left a partial line.
    fn newline_after_output(&mut self) -> io::Result<()> {
        let partial = self
            .machine
            .as_ref()
            .and_then(|m| m.output().last())
            .is_some_and(|&b| b != b'\n');
        if partial {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn next(&mut self, count: Option<&str>) -> Result<(), DebugError> {
        let count = match count.map(str::parse::<u64>) {
            None => 1,
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                writeln!(self.out, "Count must be a non-negative integer!")?;
                return Ok(());
            }
        };
        let Some(machine) = self.machine.as_mut() else {
            return Ok(());
        };
        for _ in 0..count {
            if !machine.step()? {
                break;
            }
        }
        if machine.is_ended() {
            return self.finish();
        }
        self.state = SessionState::Running;
        Ok(())
    }

    fn jump(&mut self, pos: &str) -> Result<(), DebugError> {
        let Some(pos) = self.parse_position(pos)? else {
            return Ok(());
        };
        if let Some(machine) = self.machine.as_mut() {
            machine.set_program_counter(pos);
        }
        self.state = SessionState::Running;
        self.resume(false)
    }

    fn print_cell(&mut self, addr: &str) -> Result<(), DebugError> {
        let Ok(address) = addr.parse::<isize>() else {
            writeln!(self.out, "Position must be an integer!")?;
            return Ok(());
        };
        let Some(machine) = self.machine.as_ref() else {
            return Ok(());
        };
        match machine.read_cell(address) {
            Ok(value) => writeln!(self.out, "${address} = {value} (0x{value:08x})")?,
            Err(err) => writeln!(self.out, "{err}")?,
        }
        Ok(())
    }

    fn set_breakpoint(&mut self, pos: &str) -> Result<(), DebugError> {
        let Some(pos) = self.parse_breakpoint(pos)? else {
            return Ok(());
        };
        if self.breakpoints.insert(pos) {
            writeln!(self.out, "Breakpoint #{} at position {pos}", self.breakpoints.len())?;
        } else {
            writeln!(self.out, "Breakpoint already exists at position {pos}")?;
        }
        Ok(())
    }

    fn clear_breakpoint(&mut self, pos: &str) -> Result<(), DebugError> {
        let Some(pos) = self.parse_breakpoint(pos)? else {
            return Ok(());
        };
        if self.breakpoints.remove(&pos) {
            writeln!(self.out, "Breakpoint cleared at position {pos}")?;
        } else {
            writeln!(self.out, "A breakpoint does not exist at position {pos}")?;
        }
        Ok(())
    }

    fn set_watchpoint(&mut self, args: &[&str]) -> Result<(), DebugError> {
        let (address, condition) = match watch::parse_watch(args) {
            Ok(parsed) => parsed,
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(());
            }
        };
        let in_range = match self.machine.as_ref() {
            Some(machine) => machine.contains_address(address),
            None => machine::tape_contains(TAPE_SIZE, address),
        };
        if !in_range {
            writeln!(self.out, "Address {address} is outside the tape")?;
            return Ok(());
        }

        match self.watchpoints.insert(address, condition) {
            Some(old) => writeln!(
                self.out,
                "Watchpoint on ${address} changed from ({old}) to ({condition})"
            )?,
            None => writeln!(
                self.out,
                "Watchpoint #{}: ${address} {condition}",
                self.watchpoints.len()
            )?,
        }
        Ok(())
    }

    fn delete_watchpoint(&mut self, addr: &str) -> Result<(), DebugError> {
        let Ok(address) = addr.parse::<isize>() else {
            writeln!(self.out, "Position must be an integer!")?;
            return Ok(());
        };
        if self.watchpoints.remove(&address).is_some() {
            writeln!(self.out, "Watchpoint deleted at memory position {address}")?;
        } else {
            writeln!(self.out, "A watchpoint does not exist at memory position {address}")?;
        }
        Ok(())
    }

    fn info(&mut self) -> Result<(), DebugError> {
        let state = match self.state {
            SessionState::NotLoaded => "no program".to_string(),
            SessionState::Loaded => "not running".to_string(),
            SessionState::Running => "running".to_string(),
            SessionState::AtBreakpoint(pc) => format!("stopped at breakpoint {pc}"),
            SessionState::AtWatchpoint(hit) => format!("stopped at watchpoint on ${}", hit.address),
            SessionState::Ended => "exited".to_string(),
        };
        let path = self
            .program_path
            .as_ref()
            .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
        writeln!(self.out, "Program: {path} ({state})")?;
        if let (true, Some(machine)) = (self.is_running(), self.machine.as_ref()) {
            writeln!(
                self.out,
                "Position {} of {}, pointer at ${}, {} steps",
                machine.program_counter(),
                machine.program().len(),
                machine.pointer(),
                machine.steps()
            )?;
        }

        if self.breakpoints.is_empty() {
            writeln!(self.out, "No breakpoints.")?;
        }
        for (n, pos) in self.breakpoints.iter().enumerate() {
            writeln!(self.out, "Breakpoint #{} at position {pos}", n + 1)?;
        }
        if self.watchpoints.is_empty() {
            writeln!(self.out, "No watchpoints.")?;
        }
        for (address, condition) in &self.watchpoints {
            writeln!(self.out, "Watchpoint ${address} {condition}")?;
        }
        Ok(())
    }

    fn kill(&mut self) -> Result<(), DebugError> {
        tracing::debug!("program killed");
        self.state = SessionState::Loaded;
        writeln!(self.out, "Program killed")?;
        Ok(())
    }

    fn file(&mut self, path: &str) -> Result<(), DebugError> {
        let candidate = Path::new(path);
        if !candidate.is_file() {
            writeln!(self.out, "{path}: No such file.")?;
            return Ok(());
        }
        writeln!(self.out, "Reading program from {path}")?;
        self.set_program(candidate);
        Ok(())
    }

    fn parse_position(&mut self, pos: &str) -> io::Result<Option<usize>> {
        match pos.parse::<usize>() {
            Ok(pos) => Ok(Some(pos)),
            Err(_) => {
                writeln!(self.out, "Position must be a non-negative integer!")?;
                Ok(None)
            }
        }
    }

    fn parse_breakpoint(&mut self, pos: &str) -> io::Result<Option<usize>> {
        match pos.parse::<usize>() {
            Ok(pos) => Ok(Some(pos)),
            Err(_) => {
                writeln!(self.out, "Breakpoint must be a non-negative integer!")?;
                Ok(None)
            }
        }
    }
}

fn first_watch_hit(machine: &Machine, watchpoints: &BTreeMap<isize, Condition>) -> Option<WatchHit> {
    watchpoints.iter().find_map(|(&address, &condition)| {
        let value = machine.read_cell(address).ok()?;
        condition.matches(value).then_some(WatchHit {
            address,
            value,
            condition,
        })
    })
}

/// Drive `debugger` with lines from `console` until EOF or `quit`.
pub fn command_loop<W: Write>(
    debugger: &mut Debugger<W>,
    console: &mut dyn Console,
    prompt: &str,
) -> Result<(), DebugError> {
    while let Some(line) = console.read_line(prompt)? {
        let flow = debugger.execute(&line, console);
        debugger.out.flush()?;
        if flow? == Flow::Quit {
            break;
        }
    }
    Ok(())
}
