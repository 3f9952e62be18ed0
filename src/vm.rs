//! Structures and functions for the virtual machine proper: the fetch-decode-execute loop.

use std::fmt::{Display, Formatter};
use std::io::Write;
use std::ops::Range;

use log::{info, warn};
#[cfg(feature = "trace_computation")]
use log::trace;

use crate::address::{Word, MODULUS, VALUE_MASK};
use crate::bytecode::Opcode;
use crate::error::VmError;
use crate::io::{CharSource, IoChannel};
use crate::memory::AddressSpace;
use crate::operand::{operand_value, read_memory, write_destination, write_memory};
use crate::snapshot::Snapshot;
use crate::stack::Stack;

/// Why the machine stopped without an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HaltReason {
  /// The `halt` instruction.
  Halt,
  /// `ret` with nothing on the stack, i.e. the program returned from its outermost routine.
  ReturnUnderflow,
  /// The IP pointed at a word that is not an opcode.
  UnknownOpcode(Word),
  /// The IP left memory.
  IpOutOfRange(Word),
  /// `in` with the operator's input closed.
  InputExhausted,
}

impl Display for HaltReason {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      HaltReason::Halt              => write!(f, "halt instruction"),
      HaltReason::ReturnUnderflow   => write!(f, "return with empty stack"),
      HaltReason::UnknownOpcode(op) => write!(f, "unknown opcode {}", op),
      HaltReason::IpOutOfRange(ip)  => write!(f, "ip {} outside memory", ip),
      HaltReason::InputExhausted    => write!(f, "input closed"),
    }
  }
}

/// The outcome of one `step`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Step {
  Continue,
  Halted(HaltReason),
}

pub struct VM<I: CharSource, O: Write> {
  // Memory Stores
  space : AddressSpace, // Memory and registers
  stack : Stack,        // Data and return addresses, untyped

  io    : IoChannel<I, O>,

  // Registers //
  ip    : Word,         // Instruction pointer
  steps : u64,          // Instructions executed
}

impl<I: CharSource, O: Write> VM<I, O> {

  // region Low-level utility methods

  pub fn new(input: I, output: O) -> VM<I, O> {
    VM {
      space : AddressSpace::new(),
      stack : Stack::new(),
      io    : IoChannel::new(input, output),
      ip    : 0,
      steps : 0,
    }
  }

  pub fn space(&self) -> &AddressSpace {
    &self.space
  }

  /// For the loader, before the first `step`.
  pub fn space_mut(&mut self) -> &mut AddressSpace {
    &mut self.space
  }

  pub fn stack(&self) -> &Stack {
    &self.stack
  }

  pub fn ip(&self) -> Word {
    self.ip
  }

  pub fn steps(&self) -> u64 {
    self.steps
  }

  pub fn output(&self) -> &O {
    self.io.output()
  }

  pub fn snapshot(&self, memory: Range<usize>) -> Snapshot {
    Snapshot::capture(&self.space, &self.stack, self.ip, self.steps, memory)
  }

  /// The value-producing operand `offset` words after the opcode.
  fn value(&self, offset: Word) -> Word {
    operand_value(&self.space, self.ip, offset)
  }

  /// Writes to the destination operand, which is always the first.
  fn store(&mut self, value: Word) {
    write_destination(&mut self.space, self.ip, value);
  }

  // endregion

  // region Execution

  /// Runs until the machine halts. Only fatal conditions are errors.
  pub fn run(&mut self) -> Result<HaltReason, VmError> {
    loop {
      if let Step::Halted(reason) = self.step()? {
        info!("Halted after {} steps at ip {}: {}", self.steps, self.ip, reason);
        return Ok(reason);
      }
    }
  }

  /**
    Executes exactly one instruction.

    Every operand read happens before the destination write, and the IP is only moved once the
    instruction is complete, so a halting instruction leaves the IP pointing at itself.
  */
  pub fn step(&mut self) -> Result<Step, VmError> {
    let ip = self.ip;

    let word = match self.space.cell(ip) {
      Ok(word) => word,
      Err(_)   => {
        warn!("ip {} is outside memory", ip);
        return Ok(Step::Halted(HaltReason::IpOutOfRange(ip)));
      }
    };

    let opcode = match Opcode::from_word(word) {
      Some(opcode) => opcode,
      None         => {
        warn!("{}", VmError::UnknownOpcode { opcode: word, ip });
        return Ok(Step::Halted(HaltReason::UnknownOpcode(word)));
      }
    };

    #[cfg(feature = "trace_computation")]
    trace!("{}", self.snapshot(0..0));

    self.steps += 1;
    let next = ip.wrapping_add(opcode.size());

    match opcode {

      Opcode::Halt => {
        return Ok(Step::Halted(HaltReason::Halt));
      }

      Opcode::Set => {
        let b = self.value(2);
        self.store(b);
      }

      Opcode::Push => {
        let a = self.value(1);
        self.stack.push(a);
      }

      Opcode::Pop => {
        let top = self.stack.pop().ok_or(VmError::StackUnderflow { ip })?;
        self.store(top);
      }

      Opcode::Eq => {
        let result = (self.value(2) == self.value(3)) as Word;
        self.store(result);
      }

      Opcode::Gt => {
        let result = (self.value(2) > self.value(3)) as Word;
        self.store(result);
      }

      Opcode::Jmp => {
        self.ip = self.value(1);
        return Ok(Step::Continue);
      }

      Opcode::Jt => {
        if self.value(1) != 0 {
          self.ip = self.value(2);
          return Ok(Step::Continue);
        }
      }

      Opcode::Jf => {
        if self.value(1) == 0 {
          self.ip = self.value(2);
          return Ok(Step::Continue);
        }
      }

      Opcode::Add => {
        let sum = (self.value(2) as u32 + self.value(3) as u32) % MODULUS;
        self.store(sum as Word);
      }

      Opcode::Mult => {
        let product = (self.value(2) as u32 * self.value(3) as u32) % MODULUS;
        self.store(product as Word);
      }

      Opcode::Mod => {
        let (b, c) = (self.value(2), self.value(3));
        if c == 0 {
          return Err(VmError::DivisionByZero { ip });
        }
        self.store(b % c);
      }

      Opcode::And => {
        let result = self.value(2) & self.value(3);
        self.store(result);
      }

      Opcode::Or => {
        let result = self.value(2) | self.value(3);
        self.store(result);
      }

      Opcode::Not => {
        let result = !self.value(2) & VALUE_MASK;
        self.store(result);
      }

      Opcode::Rmem => {
        let address = self.value(2);
        let word    = read_memory(&self.space, ip, address);
        self.store(word);
      }

      Opcode::Wmem => {
        let (address, word) = (self.value(1), self.value(2));
        write_memory(&mut self.space, ip, address, word);
      }

      Opcode::Call => {
        let target = self.value(1);
        self.stack.push(next);
        self.ip = target;
        return Ok(Step::Continue);
      }

      Opcode::Ret => {
        match self.stack.pop() {
          Some(address) => {
            self.ip = address;
            return Ok(Step::Continue);
          }
          None => return Ok(Step::Halted(HaltReason::ReturnUnderflow))
        }
      }

      Opcode::Out => {
        let a = self.value(1);
        self.io.write_char(a)?;
      }

      Opcode::In => {
        match self.io.read_char()? {
          Some(c) => self.store(c),
          None    => return Ok(Step::Halted(HaltReason::InputExhausted))
        }
      }

      Opcode::Noop => {}

    } // end match on opcode

    self.ip = next;
    Ok(Step::Continue)
  }

  // endregion
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  use crate::address::{Word, SENTINEL};
  use crate::bytecode::{encode_image, parse_assembly};
  use crate::io::LineInput;
  use crate::loader::load_image;

  type TestVM = VM<LineInput<Cursor<Vec<u8>>>, Vec<u8>>;

  fn vm_with_input(words: &[Word], input: &str) -> TestVM {
    let mut vm = VM::new(LineInput::new(Cursor::new(input.as_bytes().to_vec())), Vec::new());
    load_image(vm.space_mut(), &encode_image(words)).unwrap();
    vm
  }

  fn vm(words: &[Word]) -> TestVM {
    vm_with_input(words, "")
  }

  fn assembled(text: &str, input: &str) -> TestVM {
    vm_with_input(&parse_assembly(text).unwrap(), input)
  }

  fn output(vm: &TestVM) -> String {
    String::from_utf8(vm.output().clone()).unwrap()
  }

  #[test]
  fn scenario_add_out_halt(){
    let mut vm = vm(&[9, 32768, 4, 32769, 19, 32768, 0]);
    assert_eq!(vm.run().unwrap(), HaltReason::Halt);
    assert_eq!(vm.output(), &vec![4u8]);
    assert_eq!(vm.space().register(0), 4);
    assert_eq!(vm.ip(), 6);
    assert_eq!(vm.steps(), 3);
  }

  #[test]
  fn add_wraps(){
    let mut vm = assembled("set r1 32767\nadd r0 r1 32767\nhalt", "");
    vm.run().unwrap();
    assert_eq!(vm.space().register(0), 32766);
  }

  #[test]
  fn mult_wraps(){
    let mut vm = assembled("mult r0 182 359\nhalt", "");
    vm.run().unwrap();
    assert_eq!(vm.space().register(0), 32570);
  }

  #[test]
  fn not_is_fifteen_bits(){
    let mut vm = assembled("not r0 0\nnot r1 32767\nnot r2 21845\nhalt", "");
    vm.run().unwrap();
    assert_eq!(vm.space().register(0), 32767);
    assert_eq!(vm.space().register(1), 0);
    assert_eq!(vm.space().register(2), 10922);
  }

  #[test]
  fn comparisons_and_bitwise(){
    let text = "
      eq  r0 5 5
      eq  r1 5 6
      gt  r2 6 5
      gt  r3 5 5
      and r4 12 10
      or  r5 12 10
      mod r6 17 5
      halt
    ";
    let mut vm = assembled(text, "");
    vm.run().unwrap();
    assert_eq!(&vm.space().registers()[..7], &[1, 0, 1, 0, 8, 14, 2]);
  }

  #[test]
  fn push_pop_roundtrip(){
    let mut vm = assembled("push 7\npush 9\npop r0\npop r1\nhalt", "");
    vm.run().unwrap();
    assert_eq!(vm.space().register(0), 9);
    assert_eq!(vm.space().register(1), 7);
    assert!(vm.stack().is_empty());
  }

  #[test]
  fn pop_on_empty_stack_is_fatal(){
    let mut vm = assembled("noop\npop r0\nhalt", "");
    assert!(matches!(vm.run(), Err(VmError::StackUnderflow { ip: 1 })));
  }

  #[test]
  fn call_and_ret(){
    let text = "
            call sub     # 0
            out 'b'      # 2
            halt         # 4
      sub:  out 'a'      # 5
            ret          # 7
    ";
    let mut vm = assembled(text, "");
    assert_eq!(vm.step().unwrap(), Step::Continue);
    assert_eq!(vm.ip(), 5);
    assert_eq!(vm.stack().peek(), Some(2));
    assert_eq!(vm.run().unwrap(), HaltReason::Halt);
    assert_eq!(output(&vm), "ab");
  }

  #[test]
  fn ret_on_empty_stack_halts(){
    let mut vm = assembled("out 'x'\nret\nout 'y'", "");
    assert_eq!(vm.run().unwrap(), HaltReason::ReturnUnderflow);
    assert_eq!(output(&vm), "x");
  }

  #[test]
  fn stack_is_shared_by_data_and_calls(){
    // Push a return address by hand and `ret` to it.
    let mut vm = assembled("push done\nret\nout 'n'\ndone: out 'y'\nhalt", "");
    vm.run().unwrap();
    assert_eq!(output(&vm), "y");
  }

  #[test]
  fn jt_and_jf(){
    let mut vm = assembled("jt 0 99\njf 1 99\njt 5 8\nhalt\nhalt", "");
    vm.step().unwrap();
    assert_eq!(vm.ip(), 3);
    vm.step().unwrap();
    assert_eq!(vm.ip(), 6);
    vm.step().unwrap();
    assert_eq!(vm.ip(), 8);

    let mut vm = assembled("jf 0 5\nhalt\nhalt", "");
    vm.step().unwrap();
    assert_eq!(vm.ip(), 5);
  }

  #[test]
  fn jmp_through_register(){
    let mut vm = assembled("set r3 end\njmp r3\nout 'n'\nend: halt", "");
    vm.run().unwrap();
    assert_eq!(output(&vm), "");
    assert_eq!(vm.ip(), 7);
  }

  #[test]
  fn in_echoes_in_typed_order(){
    let text = "
      in r0
      out r0
      in r0
      out r0
      in r0
      out r0
      halt
    ";
    let mut vm = assembled(text, "ab\n");
    assert_eq!(vm.run().unwrap(), HaltReason::Halt);
    assert_eq!(output(&vm), "ab\n");
  }

  #[test]
  fn in_with_closed_input_halts(){
    let mut vm = assembled("in r0\nhalt", "");
    assert_eq!(vm.run().unwrap(), HaltReason::InputExhausted);
    assert_eq!(vm.ip(), 0);
  }

  #[test]
  fn rmem_and_wmem(){
    let text = "
            wmem cell 1234
            set  r1 cell
            rmem r0 r1
            halt
      cell: data 0
    ";
    let mut vm = assembled(text, "");
    vm.run().unwrap();
    assert_eq!(vm.space().register(0), 1234);
    assert_eq!(vm.space().cell(10).unwrap(), 1234);
  }

  #[test]
  fn destination_may_be_memory(){
    // The destination cell holds a literal, so the write lands in memory.
    let mut vm = vm(&[1, 10, 77, 0]);
    vm.run().unwrap();
    assert_eq!(vm.space().cell(10).unwrap(), 77);
  }

  #[test]
  fn self_modifying_code(){
    // Overwrite the `out 'n'` at 3 with `out 'y'`.
    let mut vm = assembled("wmem 4 'y'\nout 'n'\nhalt", "");
    vm.run().unwrap();
    assert_eq!(output(&vm), "y");
  }

  #[test]
  fn unknown_opcode_halts_without_side_effects(){
    let mut vm = vm(&[1, 32768, 5, 22, 32768, 9]);
    assert_eq!(vm.run().unwrap(), HaltReason::UnknownOpcode(22));
    assert_eq!(vm.space().register(0), 5);
    assert_eq!(vm.ip(), 3);
    assert_eq!(vm.steps(), 1);
  }

  #[test]
  fn invalid_operand_uses_sentinel(){
    let mut vm = vm(&[1, 32768, 40000, 0]);
    assert_eq!(vm.run().unwrap(), HaltReason::Halt);
    assert_eq!(vm.space().register(0), SENTINEL);
  }

  #[test]
  fn invalid_destination_is_discarded(){
    let mut vm = vm(&[1, 40000, 5, 0]);
    assert_eq!(vm.run().unwrap(), HaltReason::Halt);
    assert_eq!(vm.space().registers(), &[0; 8]);
    assert_eq!(vm.space().cell(1).unwrap(), 40000);
  }

  #[test]
  fn mod_by_zero_is_fatal(){
    let mut vm = assembled("mod r0 5 0", "");
    assert!(matches!(vm.run(), Err(VmError::DivisionByZero { ip: 0 })));
  }

  #[test]
  fn noop_advances_by_one(){
    let mut vm = vm(&[21, 21, 0]);
    vm.step().unwrap();
    assert_eq!(vm.ip(), 1);
    assert_eq!(vm.run().unwrap(), HaltReason::Halt);
    assert_eq!(vm.ip(), 2);
  }

  #[test]
  fn running_off_the_end_of_memory(){
    let mut vm = vm(&[6, 32767]);
    vm.space_mut().write_memory(32767, 21).unwrap();
    assert_eq!(vm.run().unwrap(), HaltReason::IpOutOfRange(32768));
  }
}
