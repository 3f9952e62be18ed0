//! Errors reported by the machine, the loader and the assembler.
//!
//! Only some of these stop a run. `InvalidEncoding` and `InvalidWrite` are recovered from locally
//! by the engine (see `vm::VM::step`); the rest propagate out of `run` with `?`.

use std::io;

use thiserror::Error;

use crate::address::Word;

#[derive(Debug, Error)]
pub enum VmError {
  /// A cell used as an operand holds a value outside `0..=32775`.
  #[error("invalid operand encoding {0}")]
  InvalidEncoding(Word),

  /// A destination names something that is neither a register nor a memory cell.
  #[error("invalid write destination {0}")]
  InvalidWrite(Word),

  /// `pop` on an empty stack. (`ret` on an empty stack is a halt, not an error.)
  #[error("stack underflow at ip {ip}")]
  StackUnderflow { ip: Word },

  #[error("unknown opcode {opcode} at ip {ip}")]
  UnknownOpcode { opcode: Word, ip: Word },

  #[error("division by zero at ip {ip}")]
  DivisionByZero { ip: Word },

  #[error("image of {words} words does not fit in memory")]
  ImageTooLarge { words: usize },

  #[error("line {line}: {message}")]
  Assembly { line: usize, message: String },

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}
