/*!

  The VM uses a 16 bit little-endian word size. An instruction is an opcode word followed by zero
  to three operand words; the number of operands is fixed per opcode (see `Opcode::arity`).
  There is no alignment and no padding: the instruction after one at `ip` starts at
  `ip + 1 + arity`, which is exactly the amount the engine advances the IP by for every
  instruction that does not jump.

  Operand words use the same encoding as everything else in memory:

    0..=32767       a literal value
    32768..=32775   registers r0..r7
    32776..=65535   invalid

  A program image is just memory contents, word 0 first, with no header.

  As in the rest of the codebase, an enum is only used for the opcode itself, not for the entire
  instruction. Instructions live in memory as raw words because programs read and rewrite their
  own code; `Instruction` is only a decoded view for display and tracing.

*/

mod binary;
mod instruction;
mod assembly;

pub use binary::{decode_image, encode_image};
pub use instruction::{Instruction, Opcode, Operand};
pub use assembly::parse_assembly;
