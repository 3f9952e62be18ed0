//! The machine's single stack. Data pushed by `push` and return addresses pushed by `call` share
//! it untyped; programs rely on mixing the two.

use crate::address::Word;

#[derive(Clone, Debug, Default)]
pub struct Stack {
  words: Vec<Word>,
}

impl Stack {

  pub fn new() -> Stack {
    Stack { words: Vec::new() }
  }

  pub fn push(&mut self, value: Word) {
    self.words.push(value);
  }

  /// `None` when empty. Whether that is fatal is the caller's decision.
  pub fn pop(&mut self) -> Option<Word> {
    self.words.pop()
  }

  pub fn peek(&self) -> Option<Word> {
    self.words.last().copied()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn depth(&self) -> usize {
    self.words.len()
  }
}
