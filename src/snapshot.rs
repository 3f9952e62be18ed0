/*!
  A read-only, owned copy of the machine state: the IP, the registers, a window of memory, the
  stack and the operands of the instruction about to execute. Anything that wants to look at a
  running machine (the `--dump` option, the trace, a future inspector) takes one of these instead
  of holding on to the machine.
*/

use std::fmt::{Display, Formatter};
use std::ops::Range;

use prettytable::{format as TableFormat, row, table, Table};
use lazy_static::lazy_static;

use crate::address::{Address, Word, MEMORY_SIZE, REGISTER_COUNT};
use crate::bytecode::Instruction;
use crate::memory::AddressSpace;
use crate::stack::Stack;

/// One operand cell of the next instruction, read both ways.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperandView {
  pub cell  : Word,
  pub raw   : Word,
  /// `read_register_operand`, `None` if the encoding is invalid.
  pub value : Option<Word>,
  /// `read_memory_operand`, `None` if the encoding is invalid.
  pub at    : Option<Word>,
}

#[derive(Clone, Debug)]
pub struct Snapshot {
  pub ip          : Word,
  pub steps       : u64,
  pub registers   : [Word; REGISTER_COUNT],
  pub next        : Instruction,
  pub operands    : Vec<OperandView>,
  pub memory_base : usize,
  pub memory      : Vec<Word>,
  pub stack_depth : usize,
  pub stack_top   : Option<Word>,
}

impl Snapshot {

  pub fn capture(
      space  : &AddressSpace,
      stack  : &Stack,
      ip     : Word,
      steps  : u64,
      memory : Range<usize>
    ) -> Snapshot
  {
    let next = Instruction::decode(space.memory_range(0, MEMORY_SIZE), ip as usize);
    let operands =
      (1..next.size())
        .map(|k| ip.wrapping_add(k))
        .filter_map(|cell| {
          space.cell(cell).ok().map(|raw| OperandView {
            cell,
            raw,
            value : space.read_register_operand(cell).ok(),
            at    : space.read_memory_operand(cell).ok(),
          })
        })
        .collect();
    let window = space.memory_range(memory.start, memory.end);

    Snapshot {
      ip,
      steps,
      registers   : *space.registers(),
      next,
      operands,
      memory_base : memory.start.min(MEMORY_SIZE),
      memory      : window.to_vec(),
      stack_depth : stack.depth(),
      stack_top   : stack.peek(),
    }
  }

  // region Display methods

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for (i, value) in self.registers.iter().enumerate() {
      table.add_row(row![r->format!("{} =", Address::Register(i)), value]);
    }
    table
  }

  fn make_memory_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, word) in self.memory.iter().enumerate() {
      let address = self.memory_base + i;
      match address == self.ip as usize {

        true  => {
          table.add_row(row![r->format!("* --> [{}] =", address), word]);
        }

        false => {
          table.add_row(row![r->format!("[{}] =", address), word]);
        }

      }
    }
    table
  }

  fn make_operand_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Cell", ub->"Raw", ub->"Value", ubl->"At"]);

    let show = |v: Option<Word>| v.map_or("?".to_string(), |v| v.to_string());
    for operand in &self.operands {
      table.add_row(row![r->operand.cell, operand.raw, show(operand.value), show(operand.at)]);
    }
    table
  }

  // endregion
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Snapshot {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let r_table = self.make_register_table();
    let m_table = self.make_memory_table();
    let o_table = self.make_operand_table();

    let mut combined_table = table!([r_table, m_table, o_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Memory", ub->"Operands"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let top = match self.stack_top {
      Some(word) => word.to_string(),
      None       => "-".to_string()
    };

    write!(
      f,
      "IP: {}\tNext: {}\tSteps: {}\tStack depth: {} (top {})\n{}",
      self.ip, self.next, self.steps, self.stack_depth, top, combined_table
    )
  }
}
