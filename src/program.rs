//! Program loading: filtering raw source down to instructions and pairing
//! loop brackets.
//!
//! Any byte outside `><+-.,[]` is treated as a comment and dropped. Loop
//! brackets must balance; the loader pairs them with a stack and records the
//! partner of every bracket in a [`JumpTable`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading a program.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A `[` or `]` had no partner.
    #[error("Unmatched bracket {kind} at instruction {index}")]
    UnmatchedBracket {
        /// Index into the filtered instruction stream.
        index: usize,
        /// Byte offset into the raw source, for error context.
        offset: usize,
        kind: BracketKind,
    },

    /// The program file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// One of the eight Brainfuck operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Right,
    Left,
    Increment,
    Decrement,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl Instruction {
    /// Decode a source byte. Returns `None` for comment bytes.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'>' => Instruction::Right,
            b'<' => Instruction::Left,
            b'+' => Instruction::Increment,
            b'-' => Instruction::Decrement,
            b'.' => Instruction::Output,
            b',' => Instruction::Input,
            b'[' => Instruction::LoopStart,
            b']' => Instruction::LoopEnd,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Instruction::Right => '>',
            Instruction::Left => '<',
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Output => '.',
            Instruction::Input => ',',
            Instruction::LoopStart => '[',
            Instruction::LoopEnd => ']',
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Bidirectional mapping between matched bracket positions.
///
/// `partners[i]` holds the matching index for a `[` or `]` at `i`, and is
/// `None` for every other instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpTable {
    partners: Vec<Option<usize>>,
}

impl JumpTable {
    /// The matching bracket of the bracket at `index`.
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.partners.get(index).copied().flatten()
    }

    /// Number of bracket pairs.
    pub fn pairs(&self) -> usize {
        self.partners.iter().filter(|p| p.is_some()).count() / 2
    }
}

/// A loaded program: the filtered instruction stream and its jump table.
///
/// Immutable once built; a reload replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    jumps: JumpTable,
}

impl Program {
    /// Filter `source` and pair its brackets in a single pass.
    pub fn parse(source: &[u8]) -> Result<Self, LoadError> {
        let mut instructions = Vec::new();
        let mut partners = Vec::new();
        // (instruction index, source offset) of every open '['
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for (offset, &byte) in source.iter().enumerate() {
            let Some(instr) = Instruction::from_byte(byte) else {
                continue;
            };
            let index = instructions.len();
            instructions.push(instr);
            partners.push(None);

            match instr {
                Instruction::LoopStart => stack.push((index, offset)),
                Instruction::LoopEnd => {
                    let Some((open, _)) = stack.pop() else {
                        return Err(LoadError::UnmatchedBracket {
                            index,
                            offset,
                            kind: BracketKind::Close,
                        });
                    };
                    partners[open] = Some(index);
                    partners[index] = Some(open);
                }
                _ => {}
            }
        }

        if let Some(&(index, offset)) = stack.last() {
            return Err(LoadError::UnmatchedBracket {
                index,
                offset,
                kind: BracketKind::Open,
            });
        }

        let program = Self {
            instructions,
            jumps: JumpTable { partners },
        };
        tracing::debug!(
            instructions = program.len(),
            loops = program.jumps.pairs(),
            "program loaded"
        );
        Ok(program)
    }

    /// Read a program file and parse it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::parse(&read_source(path)?)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<Instruction> {
        self.instructions.get(index).copied()
    }

    pub fn jumps(&self) -> &JumpTable {
        &self.jumps
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// The canonical instruction stream, comments stripped.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instructions {
            write!(f, "{instr}")?;
        }
        Ok(())
    }
}

/// Read raw program bytes from `path`.
pub fn read_source(path: impl AsRef<Path>) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    #[test]
    fn comments_are_filtered_out() {
        let program = Program::parse(b"hello + world - [ comment > ] <").unwrap();
        assert_eq!(program.to_string(), "+-[>]<");
        assert_eq!(program.len(), 6);
    }

    #[test]
    fn length_equals_recognized_symbol_count() {
        let source = "a+b-c>d<e.f,g[h]i\n\t";
        let expected = source.chars().filter(|c| "><+-.,[]".contains(*c)).count();
        let program = Program::parse(source.as_bytes()).unwrap();
        assert_eq!(program.len(), expected);
    }

    #[test]
    fn empty_source_is_a_valid_empty_program() {
        let program = Program::parse(b"no instructions here").unwrap();
        assert!(program.is_empty());
        assert_eq!(program.jumps().pairs(), 0);
    }

    #[test]
    fn jump_table_is_an_involution_on_brackets() {
        let program = Program::parse(HELLO.as_bytes()).unwrap();
        let mut brackets = 0;
        for (i, instr) in program.instructions().iter().enumerate() {
            match instr {
                Instruction::LoopStart | Instruction::LoopEnd => {
                    brackets += 1;
                    let j = program.jumps().partner(i).expect("bracket has a partner");
                    assert_eq!(program.jumps().partner(j), Some(i));
                    if *instr == Instruction::LoopStart {
                        assert!(j > i);
                    }
                }
                _ => assert_eq!(program.jumps().partner(i), None),
            }
        }
        assert_eq!(program.jumps().pairs() * 2, brackets);
    }

    #[test]
    fn nested_loops_pair_innermost_first() {
        let program = Program::parse(b"[[]]").unwrap();
        assert_eq!(program.jumps().partner(0), Some(3));
        assert_eq!(program.jumps().partner(1), Some(2));
    }

    #[test]
    fn unmatched_close_reports_source_offset() {
        let err = Program::parse(b"+ ]").unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnmatchedBracket { index: 1, offset: 2, kind: BracketKind::Close }
        ));
    }

    #[test]
    fn unmatched_open_reports_innermost_open() {
        let err = Program::parse(b"[ [ ]").unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnmatchedBracket { index: 0, offset: 0, kind: BracketKind::Open }
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Program::from_file("/definitely/not/here.bf").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
