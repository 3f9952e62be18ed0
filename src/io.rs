/*!
  Character I/O with the operator.

  Input is read a whole line at a time and handed out one character per `in` instruction, in the
  order it was typed. The refill policy is `LineInput`'s; the engine only sees a `CharSource`.
  Output is written and flushed one character at a time.
*/

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::address::Word;

/// A source of input characters. `next_char` blocks until a character is available and returns
/// `None` only when the input is closed for good.
pub trait CharSource {
  fn next_char(&mut self) -> io::Result<Option<u8>>;
}

/// Refills from `reader` one line (including its `\n`) at a time, only once the previous line has
/// been consumed.
pub struct LineInput<R: BufRead> {
  reader  : R,
  pending : VecDeque<u8>,
}

impl<R: BufRead> LineInput<R> {
  pub fn new(reader: R) -> LineInput<R> {
    LineInput {
      reader,
      pending: VecDeque::new()
    }
  }

  /// Characters of the current line not yet handed out.
  pub fn pending(&self) -> usize {
    self.pending.len()
  }

  fn refill(&mut self) -> io::Result<usize> {
    let mut line = Vec::new();
    let read = self.reader.read_until(b'\n', &mut line)?;
    self.pending.extend(line);
    Ok(read)
  }
}

impl<R: BufRead> CharSource for LineInput<R> {
  fn next_char(&mut self) -> io::Result<Option<u8>> {
    if self.pending.is_empty() && self.refill()? == 0 {
      return Ok(None);
    }
    Ok(self.pending.pop_front())
  }
}

pub struct IoChannel<I: CharSource, O: Write> {
  input  : I,
  output : O,
}

impl<I: CharSource, O: Write> IoChannel<I, O> {

  pub fn new(input: I, output: O) -> IoChannel<I, O> {
    IoChannel { input, output }
  }

  /// Writes the character whose code point is `code`. Codes that are not a valid `char` are
  /// written as U+FFFD.
  pub fn write_char(&mut self, code: Word) -> io::Result<()> {
    let c = char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut buffer = [0u8; 4];
    self.output.write_all(c.encode_utf8(&mut buffer).as_bytes())?;
    self.output.flush()
  }

  /// The next input character code, or `None` once input is closed.
  pub fn read_char(&mut self) -> io::Result<Option<Word>> {
    Ok(self.input.next_char()?.map(Word::from))
  }

  pub fn output(&self) -> &O {
    &self.output
  }
}
