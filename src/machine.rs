//! The stepping virtual machine.
//!
//! Features and behaviors:
//! - Fixed tape of [`TAPE_SIZE`] signed 64-bit cells, all zero at creation.
//! - The data pointer starts in the middle of the tape; logical address 0 is
//!   that midpoint, so negative and positive addresses are both valid.
//! - Moving the pointer off either end of the tape is a
//!   [`MachineError::PointerOutOfBounds`] fault. The tape never grows and the
//!   pointer never wraps.
//! - `.` appends the low byte of the current cell to the output buffer and
//!   also sends it to the live output sink (stdout unless replaced).
//! - `,` consumes pre-seeded input first; once that is exhausted it asks the
//!   input provider (stdin unless replaced). On EOF the cell is left as is.
//!
//! ```no_run
//! use bfdbg::Machine;
//!
//! let mut vm = Machine::from_source(b"++++++++[>++++++++<-]>+.").unwrap();
//! vm.run().unwrap();
//! assert_eq!(vm.output(), b"A");
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::program::{Instruction, LoadError, Program};

/// Default number of cells on the tape.
pub const TAPE_SIZE: usize = 5000;

/// Whether a tape of `size` cells, centered on logical address 0, holds `address`.
pub fn tape_contains(size: usize, address: isize) -> bool {
    physical_index(size, address).is_some()
}

fn physical_index(size: usize, address: isize) -> Option<usize> {
    let size = size.max(1);
    let index = address.checked_add((size / 2) as isize)?;
    usize::try_from(index).ok().filter(|&i| i < size)
}

/// Errors raised while stepping.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// The data pointer attempted to move off the tape.
    #[error("Pointer out of bounds at instruction {pc} (pointer={pointer}, op='{op}')")]
    PointerOutOfBounds { pc: usize, pointer: isize, op: char },

    /// A logical address outside the tape was read.
    #[error("Address {address} is outside the tape")]
    AddressOutOfRange { address: isize },

    /// The interactive input source failed.
    #[error("I/O error at instruction {pc}: {source}")]
    Io {
        pc: usize,
        #[source]
        source: io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: u64 },
}

type OutputSink = Box<dyn FnMut(&[u8])>;
type InputProvider = Box<dyn FnMut() -> io::Result<Option<u8>>>;

/// A Brainfuck machine that executes one instruction per [`Machine::step`].
pub struct Machine {
    program: Program,
    pc: usize,
    memory: Vec<i64>,
    // physical index into `memory`
    pointer: usize,
    origin: usize,
    output: Vec<u8>,
    input: VecDeque<u8>,
    steps: u64,
    output_sink: Option<OutputSink>,
    input_provider: Option<InputProvider>,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Create an empty machine with a [`TAPE_SIZE`] tape.
    pub fn new() -> Self {
        Self::with_tape_size(TAPE_SIZE)
    }

    /// Create an empty machine with a custom tape length.
    pub fn with_tape_size(size: usize) -> Self {
        let size = size.max(1);
        Self {
            program: Program::default(),
            pc: 0,
            memory: vec![0; size],
            pointer: size / 2,
            origin: size / 2,
            output: Vec::new(),
            input: VecDeque::new(),
            steps: 0,
            output_sink: None,
            input_provider: None,
        }
    }

    /// Create a machine and load `source` into it.
    pub fn from_source(source: &[u8]) -> Result<Self, LoadError> {
        let mut machine = Self::new();
        machine.load(source)?;
        Ok(machine)
    }

    /// Create a machine from a program file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let mut machine = Self::new();
        machine.install(Program::from_file(path)?);
        Ok(machine)
    }

    /// Replace the program with `source`, rewinding the program counter and
    /// re-centering the pointer.
    ///
    /// The tape and the output buffer are kept. On error nothing changes.
    pub fn load(&mut self, source: &[u8]) -> Result<(), LoadError> {
        let program = Program::parse(source)?;
        self.install(program);
        Ok(())
    }

    /// Install an already parsed program.
    pub fn install(&mut self, program: Program) {
        self.program = program;
        self.pc = 0;
        self.pointer = self.origin;
    }

    /// Provide an output sink. When set, `.` sends bytes to this sink instead of stdout.
    /// The buffered output is recorded either way.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&[u8]) + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    /// Provide an input provider, consulted once pre-seeded input runs out.
    /// Returning `Ok(None)` indicates EOF (the cell is left unchanged).
    pub fn set_input_provider<F>(&mut self, provider: F)
    where
        F: FnMut() -> io::Result<Option<u8>> + 'static,
    {
        self.input_provider = Some(Box::new(provider));
    }

    /// Queue bytes for `,` to consume front to back.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Number of pre-seeded input bytes not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// True once the program counter has moved past the last instruction.
    pub fn is_ended(&self) -> bool {
        self.pc >= self.program.len()
    }

    /// Execute one instruction.
    ///
    /// Returns `Ok(false)` without touching any state once the program has
    /// ended, `Ok(true)` after executing an instruction.
    pub fn step(&mut self) -> Result<bool, MachineError> {
        let Some(instr) = self.program.get(self.pc) else {
            return Ok(false);
        };

        match instr {
            Instruction::Right => {
                if self.pointer + 1 >= self.memory.len() {
                    return Err(self.out_of_bounds(instr));
                }
                self.pointer += 1;
            }
            Instruction::Left => {
                if self.pointer == 0 {
                    return Err(self.out_of_bounds(instr));
                }
                self.pointer -= 1;
            }
            Instruction::Increment => {
                self.memory[self.pointer] = self.memory[self.pointer].wrapping_add(1);
            }
            Instruction::Decrement => {
                self.memory[self.pointer] = self.memory[self.pointer].wrapping_sub(1);
            }
            Instruction::Output => {
                let byte = [self.memory[self.pointer] as u8];
                self.output.push(byte[0]);
                match self.output_sink.as_mut() {
                    Some(sink) => sink(&byte),
                    None => {
                        let mut stdout = io::stdout().lock();
                        let _ = stdout.write_all(&byte);
                        let _ = stdout.flush();
                    }
                }
            }
            Instruction::Input => {
                if let Some(byte) = self.read_byte()? {
                    self.memory[self.pointer] = i64::from(byte);
                }
            }
            Instruction::LoopStart => {
                if self.memory[self.pointer] == 0 {
                    self.pc = self.partner(self.pc);
                }
            }
            Instruction::LoopEnd => {
                if self.memory[self.pointer] != 0 {
                    self.pc = self.partner(self.pc);
                }
            }
        }

        self.pc += 1;
        self.steps += 1;
        Ok(true)
    }

    /// Execute the program until it ends.
    pub fn run(&mut self) -> Result<(), MachineError> {
        while self.step()? {}
        Ok(())
    }

    /// Execute the program until it ends or `limit` instructions have run.
    pub fn run_with_limit(&mut self, limit: Option<u64>) -> Result<(), MachineError> {
        let Some(limit) = limit else {
            return self.run();
        };
        let start = self.steps;
        while !self.is_ended() {
            if self.steps - start >= limit {
                return Err(MachineError::StepLimitExceeded { limit });
            }
            self.step()?;
        }
        Ok(())
    }

    /// Value of the cell at a logical address.
    pub fn read_cell(&self, address: isize) -> Result<i64, MachineError> {
        self.physical(address)
            .map(|index| self.memory[index])
            .ok_or(MachineError::AddressOutOfRange { address })
    }

    /// Whether `address` names a cell on this machine's tape.
    pub fn contains_address(&self, address: isize) -> bool {
        self.physical(address).is_some()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_counter(&self) -> usize {
        self.pc
    }

    /// Force the program counter. Positions past the end simply end the program.
    pub fn set_program_counter(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// Logical address of the data pointer.
    pub fn pointer(&self) -> isize {
        self.pointer as isize - self.origin as isize
    }

    /// Everything written by `.` so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn physical(&self, address: isize) -> Option<usize> {
        physical_index(self.memory.len(), address)
    }

    fn partner(&self, pc: usize) -> usize {
        self.program
            .jumps()
            .partner(pc)
            .expect("validated bracket")
    }

    fn out_of_bounds(&self, instr: Instruction) -> MachineError {
        tracing::debug!(pc = self.pc, pointer = self.pointer(), "pointer left the tape");
        MachineError::PointerOutOfBounds {
            pc: self.pc,
            pointer: self.pointer(),
            op: instr.as_char(),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, MachineError> {
        if let Some(byte) = self.input.pop_front() {
            return Ok(Some(byte));
        }
        let pc = self.pc;
        let result = match self.input_provider.as_mut() {
            Some(provider) => provider(),
            None => {
                // Read exactly one byte from stdin.
                let mut buf = [0u8; 1];
                match io::stdin().read(&mut buf) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(buf[0])),
                    Err(e) => Err(e),
                }
            }
        };
        result.map_err(|source| MachineError::Io { pc, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
    const ROT13: &str = "-,+[-[>>++++[>++++++++<-]<+<-[>+>+>-[>>>]<[[>+<-]>>+>]<<<<<-]]>>>[-]+>--[-[<->+++[-]]]<[++++++++++++<[>-[>+>>]>[+[<+>-]>+>>]<<<<<-]>>[<+>-]>[-[-<<[-]>>]<<[<<->>-]>>]<<[<<+>>-]]<[-]<.[-]<-,+]";

    fn quiet(source: &str) -> Machine {
        let mut vm = Machine::from_source(source.as_bytes()).unwrap();
        vm.set_output_sink(|_| {});
        vm.set_input_provider(|| Ok(None));
        vm
    }

    #[test]
    fn hello_world() {
        let mut vm = quiet(HELLO);
        vm.run().unwrap();
        assert_eq!(vm.output(), b"Hello World!\n");
    }

    #[test]
    fn rot13_until_input_is_exhausted() {
        let mut vm = quiet(ROT13);
        vm.push_input(b"Hello rot13! ");
        while vm.step().unwrap() {
            if vm.pending_input() == 0 {
                break;
            }
        }
        assert_eq!(vm.output(), b"Uryyb ebg13!");
    }

    #[test]
    fn step_returns_false_after_end_without_side_effects() {
        let mut vm = quiet("+");
        assert!(vm.step().unwrap());
        assert!(vm.is_ended());
        for _ in 0..3 {
            assert!(!vm.step().unwrap());
        }
        assert_eq!(vm.program_counter(), 1);
        assert_eq!(vm.steps(), 1);
        assert_eq!(vm.read_cell(0).unwrap(), 1);
    }

    #[test]
    fn empty_program_never_steps() {
        let mut vm = quiet("");
        assert!(vm.is_ended());
        assert!(!vm.step().unwrap());
    }

    #[test]
    fn negative_addresses_are_readable() {
        let mut vm = quiet("<+++<--");
        vm.run().unwrap();
        assert_eq!(vm.pointer(), -2);
        assert_eq!(vm.read_cell(-1).unwrap(), 3);
        assert_eq!(vm.read_cell(-2).unwrap(), -2);
        assert_eq!(vm.read_cell(0).unwrap(), 0);
    }

    #[test]
    fn zero_cell_skips_loop_body() {
        let mut vm = quiet("[+++]>+");
        vm.run().unwrap();
        assert_eq!(vm.read_cell(0).unwrap(), 0);
        assert_eq!(vm.read_cell(1).unwrap(), 1);
    }

    #[test]
    fn left_pointer_out_of_bounds_errors() {
        let mut vm = Machine::with_tape_size(4);
        vm.load(b"<<<").unwrap();
        let result = vm.run();
        assert!(matches!(
            result,
            Err(MachineError::PointerOutOfBounds { pc: 2, pointer: -2, op: '<' })
        ));
    }

    #[test]
    fn right_pointer_out_of_bounds_errors() {
        let mut vm = Machine::with_tape_size(4);
        vm.load(b">>").unwrap();
        let result = vm.run();
        assert!(matches!(
            result,
            Err(MachineError::PointerOutOfBounds { pc: 1, op: '>', .. })
        ));
    }

    #[test]
    fn reading_outside_the_tape_errors() {
        let vm = Machine::new();
        let half = (TAPE_SIZE / 2) as isize;
        assert!(vm.read_cell(-half).is_ok());
        assert!(vm.read_cell(half - 1).is_ok());
        assert!(matches!(
            vm.read_cell(half),
            Err(MachineError::AddressOutOfRange { .. })
        ));
        assert!(!vm.contains_address(-half - 1));
    }

    #[test]
    fn tape_bounds_without_a_machine() {
        let half = (TAPE_SIZE / 2) as isize;
        assert!(tape_contains(TAPE_SIZE, -half));
        assert!(tape_contains(TAPE_SIZE, half - 1));
        assert!(!tape_contains(TAPE_SIZE, half));
        assert!(!tape_contains(TAPE_SIZE, isize::MIN));
        let small = Machine::with_tape_size(4);
        for address in -4..4 {
            assert_eq!(tape_contains(4, address), small.contains_address(address), "address {address}");
        }
    }

    #[test]
    fn input_queue_then_provider_then_eof() {
        let mut vm = Machine::from_source(b",>,>,").unwrap();
        vm.set_output_sink(|_| {});
        let mut fallback = vec![b'z'];
        vm.set_input_provider(move || Ok(fallback.pop()));
        vm.push_input(b"a");
        vm.run().unwrap();
        assert_eq!(vm.read_cell(0).unwrap(), i64::from(b'a'));
        assert_eq!(vm.read_cell(1).unwrap(), i64::from(b'z'));
        assert_eq!(vm.read_cell(2).unwrap(), 0);
    }

    #[test]
    fn output_reaches_sink_and_buffer() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut vm = Machine::from_source(b"+++.+.").unwrap();
        let sink = Rc::clone(&seen);
        vm.set_output_sink(move |bytes| sink.borrow_mut().extend_from_slice(bytes));
        vm.run().unwrap();
        assert_eq!(vm.output(), &[3, 4]);
        assert_eq!(*seen.borrow(), vec![3, 4]);
    }

    #[test]
    fn reload_keeps_output_and_rewinds() {
        let mut vm = quiet(">+.");
        vm.run().unwrap();
        vm.load(b"+.").unwrap();
        assert_eq!(vm.program_counter(), 0);
        assert_eq!(vm.pointer(), 0);
        vm.run().unwrap();
        assert_eq!(vm.output(), &[1, 1]);
    }

    #[test]
    fn failed_load_leaves_program_installed() {
        let mut vm = quiet("+-");
        assert!(vm.load(b"[").is_err());
        assert_eq!(vm.program().to_string(), "+-");
    }

    #[test]
    fn step_limit_aborts_infinite_loop() {
        let mut vm = quiet("+[]");
        let result = vm.run_with_limit(Some(50));
        assert!(matches!(result, Err(MachineError::StepLimitExceeded { limit: 50 })));
        assert_eq!(vm.steps(), 50);
    }

    #[test]
    fn jumping_past_the_end_ends_the_program() {
        let mut vm = quiet("+++");
        vm.set_program_counter(10);
        assert!(vm.is_ended());
        assert!(!vm.step().unwrap());
    }
}
