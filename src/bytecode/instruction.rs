use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::address::{Address, Word};

/**
  Opcodes of the virtual machine.

  The discriminants are the opcode words as they appear in memory, so the order the opcodes are
  listed below is significant. `strum` gives each variant its lowercase mnemonic, which is the
  name used by the assembler and the disassembler.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[strum(serialize_all = "lowercase")]
#[repr(u16)]
pub enum Opcode {
  Halt,   // halt
  Set,    // set a b
  Push,   // push a
  Pop,    // pop a
  Eq,     // eq a b c
  Gt,     // gt a b c
  Jmp,    // jmp a
  Jt,     // jt a b
  Jf,     // jf a b
  Add,    // add a b c
  Mult,   // mult a b c
  Mod,    // mod a b c
  And,    // and a b c
  Or,     // or a b c
  Not,    // not a b
  Rmem,   // rmem a b
  Wmem,   // wmem a b
  Call,   // call a
  Ret,    // ret
  Out,    // out a
  In,     // in a
  Noop,   // noop
}

impl Opcode {
  pub fn code(&self) -> Word {
    Into::<Word>::into(*self)
  }

  /// `None` for words outside `0..=21`.
  pub fn from_word(word: Word) -> Option<Opcode> {
    Opcode::try_from(word).ok()
  }

  pub fn arity(&self) -> Word {
    match self {
      | Opcode::Halt
      | Opcode::Ret
      | Opcode::Noop  => 0,

      | Opcode::Push
      | Opcode::Pop
      | Opcode::Jmp
      | Opcode::Call
      | Opcode::Out
      | Opcode::In    => 1,

      | Opcode::Set
      | Opcode::Jt
      | Opcode::Jf
      | Opcode::Not
      | Opcode::Rmem
      | Opcode::Wmem  => 2,

      | Opcode::Eq
      | Opcode::Gt
      | Opcode::Add
      | Opcode::Mult
      | Opcode::Mod
      | Opcode::And
      | Opcode::Or    => 3,
    }
  }

  /// Instruction length in words, opcode included.
  pub fn size(&self) -> Word {
    self.arity() + 1
  }
}

/// A decoded operand word, for display.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operand {
  Address(Address),
  /// Outside both valid ranges.
  Invalid(Word),
  /// The instruction runs past the end of the words being decoded.
  Missing,
}

impl Operand {
  pub fn from_word(word: Word) -> Operand {
    match Address::classify(word) {
      Ok(address) => Operand::Address(address),
      Err(_)      => Operand::Invalid(word)
    }
  }
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Address(address) => write!(f, "{}", address),
      Operand::Invalid(word)    => write!(f, "?{}", word),
      Operand::Missing          => write!(f, "?"),
    }
  }
}

/// Holds the decoded components of an instruction.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  Op {
    opcode   : Opcode,
    operands : Vec<Operand>
  },
  /// A word that is not an opcode.
  Data(Word),
}

impl Instruction {

  /// Decodes the instruction starting at `words[ip]`.
  pub fn decode(words: &[Word], ip: usize) -> Instruction {
    let word = match words.get(ip) {
      Some(w) => *w,
      None    => return Instruction::Data(0)
    };

    match Opcode::from_word(word) {
      Some(opcode) => {
        let operands =
          (1..=opcode.arity() as usize)
            .map(|k| words.get(ip + k).map_or(Operand::Missing, |w| Operand::from_word(*w)))
            .collect();
        Instruction::Op { opcode, operands }
      }
      None => Instruction::Data(word)
    }
  }

  /// Words occupied, opcode included.
  pub fn size(&self) -> Word {
    match self {
      Instruction::Op { opcode, .. } => opcode.size(),
      Instruction::Data(_)           => 1
    }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::Op { opcode: Opcode::Out, operands } => {
        match operands.first() {
          Some(Operand::Address(Address::Literal(v))) if (0x20..0x7F).contains(v) => {
            write!(f, "out '{}'", *v as u8 as char)
          }
          Some(Operand::Address(Address::Literal(10))) => write!(f, "out '\\n'"),
          Some(operand) => write!(f, "out {}", operand),
          None          => write!(f, "out ?"),
        }
      }

      Instruction::Op { opcode, operands } => {
        write!(f, "{}", opcode)?;
        for operand in operands {
          write!(f, " {}", operand)?;
        }
        Ok(())
      }

      Instruction::Data(word) => {
        write!(f, "data {}", word)
      }

    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn opcode_words(){
    assert_eq!(Opcode::from_word(0), Some(Opcode::Halt));
    assert_eq!(Opcode::from_word(21), Some(Opcode::Noop));
    assert_eq!(Opcode::from_word(22), None);
    assert_eq!(Opcode::Wmem.code(), 16);
  }

  #[test]
  fn mnemonics(){
    assert_eq!(Opcode::Mult.to_string(), "mult");
    assert_eq!(Opcode::from_str("rmem").unwrap(), Opcode::Rmem);
    assert!(Opcode::from_str("frob").is_err());
  }

  #[test]
  fn sizes(){
    assert_eq!(Opcode::Halt.size(), 1);
    assert_eq!(Opcode::Call.size(), 2);
    assert_eq!(Opcode::Jt.size(), 3);
    assert_eq!(Opcode::Add.size(), 4);
  }

  #[test]
  fn decode_and_display(){
    let words = [9, 32768, 4, 32769, 19, 32768, 19, 65, 0, 40000];
    let add = Instruction::decode(&words, 0);
    assert_eq!(add.to_string(), "add r0 4 r1");
    assert_eq!(add.size(), 4);
    assert_eq!(Instruction::decode(&words, 4).to_string(), "out r0");
    assert_eq!(Instruction::decode(&words, 6).to_string(), "out 'A'");
    assert_eq!(Instruction::decode(&words, 8).to_string(), "halt");
    assert_eq!(Instruction::decode(&words, 9).to_string(), "data 40000");
  }

  #[test]
  fn decode_truncated(){
    let words = [1, 32768];
    assert_eq!(Instruction::decode(&words, 0).to_string(), "set r0 ?");
  }
}
