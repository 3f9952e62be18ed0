//! An `Either` type that holds the address of either a register or memory, with some convenience
//! functions. Every 16-bit word the machine consults as an operand is classified into one of the
//! two variants; anything else is an invalid encoding.

use std::fmt::{Display, Formatter};

use crate::error::VmError;

/// The machine word. Memory cells, registers, stack entries and the IP are all one `Word`.
pub type Word = u16;

/// Number of words of addressable memory. Also the modulus of all arithmetic.
pub const MEMORY_SIZE: usize = 32768;
pub const REGISTER_COUNT: usize = 8;
pub const MODULUS: u32 = 32768;

/// First register reference, i.e. the encoding of `r0`.
pub const REGISTER_BASE: Word = 32768;
/// Last valid encoding, i.e. `r7`.
pub const MAX_ENCODING: Word = REGISTER_BASE + REGISTER_COUNT as Word - 1;

/// Substituted for an operand that fails classification. Deliberately outside both valid ranges.
pub const SENTINEL: Word = 50000;

/// Masks a value to 15 bits.
pub const VALUE_MASK: Word = 0x7FFF;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Address {
  /// A value in `0..=32767`. Depending on the instruction it is either used as-is or as an index
  /// into memory.
  Literal(Word),
  /// One of the eight registers, stored here as its index `0..=7`.
  Register(usize)
}

impl Address {
  /// Classifies a raw word. Fails with `InvalidEncoding` for `32776..=65535`.
  pub fn classify(value: Word) -> Result<Address, VmError> {
    match value {
      v if (v as usize) < MEMORY_SIZE        => Ok(Address::Literal(v)),
      v if v <= MAX_ENCODING                 => Ok(Address::Register((v - REGISTER_BASE) as usize)),
      v                                      => Err(VmError::InvalidEncoding(v))
    }
  }

  /// Converts a register index back into its encoded form.
  pub fn register_encoding(idx: usize) -> Word {
    REGISTER_BASE + idx as Word
  }

  /// The raw word this address was decoded from.
  pub fn encode(&self) -> Word {
    match self {
      Address::Literal(v)    => *v,
      Address::Register(idx) => Address::register_encoding(*idx)
    }
  }

  pub fn is_register(&self) -> bool {
    match self {
      Address::Register(_) => true,
      _ => false
    }
  }
}

impl TryFrom<Word> for Address {
  type Error = VmError;

  fn try_from(value: Word) -> Result<Self, Self::Error> {
    Address::classify(value)
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Address::Literal(v) => {
        write!(f, "{}", v)
      },
      Address::Register(i) => {
        write!(f, "r{}", i)
      }
    }
  }
}
