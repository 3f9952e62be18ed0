/*!
  The address space of the machine: 32768 words of memory and the 8-word register file.

  Every access goes through `Address::classify`. Reads return `Result` so that the caller decides
  what an invalid encoding means; nothing in here logs or substitutes values. The engine does that
  (see `operand`).
*/

use crate::address::{Address, Word, MEMORY_SIZE, REGISTER_COUNT};
use crate::error::VmError;

pub struct AddressSpace {
  memory    : Vec<Word>,
  registers : [Word; REGISTER_COUNT],
}

impl AddressSpace {

  pub fn new() -> AddressSpace {
    AddressSpace {
      memory    : vec![0; MEMORY_SIZE],
      registers : [0; REGISTER_COUNT],
    }
  }

  // region Raw access

  /// The raw word stored at `cell`. A cell past the end of memory (the IP ran off the end) is
  /// reported as an invalid encoding rather than a panic.
  pub fn cell(&self, cell: Word) -> Result<Word, VmError> {
    self.memory.get(cell as usize).copied().ok_or(VmError::InvalidEncoding(cell))
  }

  pub fn register(&self, idx: usize) -> Word {
    self.registers[idx]
  }

  pub fn set_register(&mut self, idx: usize, value: Word) {
    self.registers[idx] = value;
  }

  pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
    &self.registers
  }

  /// A window of memory, clamped to the memory size.
  pub fn memory_range(&self, start: usize, end: usize) -> &[Word] {
    let end   = end.min(MEMORY_SIZE);
    let start = start.min(end);
    &self.memory[start..end]
  }

  /// Copies `words` into memory starting at address 0. The loader checks the length first.
  pub(crate) fn fill(&mut self, words: &[Word]) {
    self.memory[..words.len()].copy_from_slice(words);
  }

  // endregion

  // region Operand access

  /// Reads the word at `cell` as an already-decoded value: a literal is itself, a register
  /// reference yields the register's contents.
  pub fn read_register_operand(&self, cell: Word) -> Result<Word, VmError> {
    match Address::classify(self.cell(cell)?)? {
      Address::Literal(v)    => Ok(v),
      Address::Register(idx) => Ok(self.registers[idx])
    }
  }

  /// Reads the word at `cell` as a location: a literal is a memory address to read through, a
  /// register reference yields the register's contents.
  pub fn read_memory_operand(&self, cell: Word) -> Result<Word, VmError> {
    match Address::classify(self.cell(cell)?)? {
      Address::Literal(v)    => Ok(self.memory[v as usize]),
      Address::Register(idx) => Ok(self.registers[idx])
    }
  }

  /// Reads memory at an already-resolved `address`. Register encodings are not memory.
  pub fn read_memory(&self, address: Word) -> Result<Word, VmError> {
    match Address::classify(address)? {
      Address::Literal(v)  => Ok(self.memory[v as usize]),
      Address::Register(_) => Err(VmError::InvalidEncoding(address))
    }
  }

  /// Writes `value` to the register or memory cell named by the raw (unresolved) word at `cell`.
  pub fn write_destination(&mut self, cell: Word, value: Word) -> Result<(), VmError> {
    let raw = self.cell(cell).map_err(|_| VmError::InvalidWrite(cell))?;
    self.write_address(raw, value)
  }

  /// Writes `value` to the register or memory cell an encoded `address` names. Nothing is mutated
  /// on failure.
  pub fn write_address(&mut self, address: Word, value: Word) -> Result<(), VmError> {
    match Address::classify(address) {
      Ok(Address::Literal(v))    => self.memory[v as usize] = value,
      Ok(Address::Register(idx)) => self.registers[idx] = value,
      Err(_)                     => return Err(VmError::InvalidWrite(address))
    }
    Ok(())
  }

  /// Writes memory at an already-resolved `address`. Register encodings are not memory.
  pub fn write_memory(&mut self, address: Word, value: Word) -> Result<(), VmError> {
    match Address::classify(address) {
      Ok(Address::Literal(v)) => {
        self.memory[v as usize] = value;
        Ok(())
      }
      _ => Err(VmError::InvalidWrite(address))
    }
  }

  // endregion
}

impl Default for AddressSpace {
  fn default() -> Self {
    AddressSpace::new()
  }
}
