/*!
  A virtual machine for a fixed 16-bit word instruction set: 32768 words of memory, eight registers
  and an unbounded stack, loaded from a raw little-endian image and run until it halts.

  Leaves first: `address` (the literal/register classification), `memory` (the address space),
  `operand` (resolution relative to the IP), `stack`, `io`, `loader`, and `vm` (the engine). The
  `bytecode` module decodes and assembles instructions; `snapshot` is the read-only view of a
  machine.
*/

pub mod address;
pub mod bytecode;
pub mod error;
pub mod io;
pub mod loader;
pub mod memory;
pub mod operand;
pub mod snapshot;
pub mod stack;
pub mod vm;

pub use error::VmError;
pub use vm::{HaltReason, Step, VM};
