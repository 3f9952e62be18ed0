//! Operand resolution relative to the instruction pointer. This is where an invalid encoding is
//! reported and replaced by `SENTINEL`, so that a corrupt cell never stops a run.

use log::warn;

use crate::address::{Word, SENTINEL};
use crate::memory::AddressSpace;

/// The value-producing operand at `ip + offset`.
pub fn operand_value(space: &AddressSpace, ip: Word, offset: Word) -> Word {
  let cell = ip.wrapping_add(offset);
  match space.read_register_operand(cell) {
    Ok(value) => value,
    Err(e)    => {
      warn!("ip {}: operand {} at cell {}: {}; using {}", ip, offset, cell, e, SENTINEL);
      SENTINEL
    }
  }
}

/// Writes `value` to the destination named by the raw cell at `ip + 1`. A bad destination is
/// reported and the write is dropped.
pub fn write_destination(space: &mut AddressSpace, ip: Word, value: Word) {
  let cell = ip.wrapping_add(1);
  if let Err(e) = space.write_destination(cell, value) {
    warn!("ip {}: {}; write of {} discarded", ip, e, value);
  }
}

/// Same reporting policy for a memory write through an already-resolved address (`wmem`).
pub fn write_memory(space: &mut AddressSpace, ip: Word, address: Word, value: Word) {
  if let Err(e) = space.write_memory(address, value) {
    warn!("ip {}: {}; write of {} discarded", ip, e, value);
  }
}

/// Same reporting policy for a memory read through an already-resolved address (`rmem`).
pub fn read_memory(space: &AddressSpace, ip: Word, address: Word) -> Word {
  match space.read_memory(address) {
    Ok(value) => value,
    Err(e)    => {
      warn!("ip {}: read of {}: {}; using {}", ip, address, e, SENTINEL);
      SENTINEL
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn invalid_operand_becomes_sentinel() {
    let mut space = AddressSpace::new();
    space.fill(&[19, 40000]);
    assert_eq!(operand_value(&space, 0, 1), SENTINEL);
  }

  #[test]
  fn operand_past_end_of_memory_becomes_sentinel() {
    let space = AddressSpace::new();
    assert_eq!(operand_value(&space, 32767, 1), SENTINEL);
  }

  #[test]
  fn destination_uses_raw_cell() {
    let mut space = AddressSpace::new();
    space.fill(&[1, 32771, 9]);
    space.set_register(3, 100);
    write_destination(&mut space, 0, 9);
    assert_eq!(space.register(3), 9);
  }

  #[test]
  fn bad_write_is_dropped() {
    let mut space = AddressSpace::new();
    write_memory(&mut space, 0, SENTINEL, 1);
    write_memory(&mut space, 0, 32768, 1);
    assert_eq!(space.memory_range(0, 4), &[0, 0, 0, 0]);
    assert_eq!(space.register(0), 0);
    assert_eq!(read_memory(&space, 0, SENTINEL), SENTINEL);
  }
}
