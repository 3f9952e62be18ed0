/*!
  The human readable textual form of bytecode is called assembly. This module parses assembly into
  image words, leveraging the `strum` derives of `Opcode` for mnemonics.

  One statement per line:

  ```text
  # comment
  start:  set r0 'A'          # registers are r0..r7, characters are 'c' or '\n'
          out r0
          add r0, r0, 1       # operands are separated by spaces or commas
          jt  r1 start        # labels may be used wherever a number may
          data 1 2 3          # raw words
          halt
  ```

  Labels are resolved in a second pass, so forward references are fine.
*/

use std::collections::HashMap;
use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::{tag, take_while},
  character::complete::{
    char as one_char,
    digit1,
    none_of,
    satisfy,
    space0,
    space1
  },
  combinator::{all_consuming, map, map_res, opt, recognize, rest, value},
  multi::many0,
  sequence::{delimited, pair, preceded, terminated, tuple},
  IResult
};

use crate::address::{Address, Word};
use crate::bytecode::Opcode;
use crate::error::VmError;

/// An operand as written, before labels are resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Argument<'a> {
  Word(Word),
  Label(&'a str),
}

/// A statement with its source line, kept for the second pass.
struct Statement<'a> {
  line      : usize,
  mnemonic  : &'a str,
  arguments : Vec<Argument<'a>>,
}

/// `(label?, (mnemonic, arguments)?)`
type ParsedLine<'a> = (Option<&'a str>, Option<(&'a str, Vec<Argument<'a>>)>);

fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(
    pair(
      satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
      take_while(|c: char| c.is_ascii_alphanumeric() || c == '_')
    )
  )(input)
}

fn register_index(name: &str) -> Option<usize> {
  let digits = name.strip_prefix('r')?;
  match digits.parse::<usize>() {
    Ok(idx) if digits.len() == 1 && idx < 8 => Some(idx),
    _ => None
  }
}

fn char_literal(input: &str) -> IResult<&str, Word> {
  map_res(
    delimited(
      one_char('\''),
      alt((
        value('\n', tag("\\n")),
        value('\'', tag("\\'")),
        value('\\', tag("\\\\")),
        none_of("\\'")
      )),
      one_char('\'')
    ),
    |c: char| Word::try_from(c as u32)
  )(input)
}

fn argument(input: &str) -> IResult<&str, Argument> {
  alt((
    map(char_literal, Argument::Word),
    map(map_res(digit1, |s: &str| s.parse::<Word>()), Argument::Word),
    map(identifier, |name| {
      match register_index(name) {
        Some(idx) => Argument::Word(Address::register_encoding(idx)),
        None      => Argument::Label(name)
      }
    })
  ))(input)
}

fn separator(input: &str) -> IResult<&str, &str> {
  alt((
    recognize(tuple((space0, one_char(','), space0))),
    space1
  ))(input)
}

fn line(input: &str) -> IResult<&str, ParsedLine> {
  all_consuming(
    delimited(
      space0,
      pair(
        opt(terminated(identifier, pair(space0, one_char(':')))),
        preceded(
          space0,
          opt(pair(identifier, many0(preceded(separator, argument))))
        )
      ),
      pair(space0, opt(preceded(one_char('#'), rest)))
    )
  )(input)
}

/**
  Assembles `text` into the words of an image. Errors carry the 1-based source line.
*/
pub fn parse_assembly(text: &str) -> Result<Vec<Word>, VmError> {
  let mut labels     : HashMap<&str, Word> = HashMap::new();
  let mut statements : Vec<Statement>      = Vec::new();
  let mut address    : usize               = 0;

  // First pass: syntax, label addresses, sizes.
  for (idx, source) in text.lines().enumerate() {
    let line_number = idx + 1;
    let (label, instruction) = match line(source) {
      Ok((_, parsed)) => parsed,
      Err(_)          => {
        return Err(VmError::Assembly { line: line_number, message: format!("syntax error: {}", source.trim()) });
      }
    };

    if let Some(label) = label {
      if register_index(label).is_some() {
        return Err(VmError::Assembly { line: line_number, message: format!("{} is a register", label) });
      }
      if labels.insert(label, address as Word).is_some() {
        return Err(VmError::Assembly { line: line_number, message: format!("duplicate label {}", label) });
      }
    }

    if let Some((mnemonic, arguments)) = instruction {
      let size = match mnemonic {
        "data" => arguments.len(),
        _      => {
          let opcode = Opcode::from_str(mnemonic).map_err(|_| VmError::Assembly {
            line    : line_number,
            message : format!("{} is not an operation", mnemonic)
          })?;
          if opcode.arity() as usize != arguments.len() {
            return Err(VmError::Assembly {
              line    : line_number,
              message : format!(
                "{} requires {} arguments but was given {}",
                opcode, opcode.arity(), arguments.len()
              )
            });
          }
          opcode.size() as usize
        }
      };
      address += size;
      statements.push(Statement { line: line_number, mnemonic, arguments });
    }
  }

  // Second pass: emit words.
  let mut words: Vec<Word> = Vec::with_capacity(address);
  for statement in statements {
    if statement.mnemonic != "data" {
      // Already validated in the first pass.
      if let Ok(opcode) = Opcode::from_str(statement.mnemonic) {
        words.push(opcode.code());
      }
    }
    for argument in statement.arguments {
      let word = match argument {
        Argument::Word(w)     => w,
        Argument::Label(name) => *labels.get(name).ok_or_else(|| VmError::Assembly {
          line    : statement.line,
          message : format!("undefined label {}", name)
        })?
      };
      words.push(word);
    }
  }

  Ok(words)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scenario_program(){
    let words = parse_assembly("add r0 4 r1\nout r0\nhalt\n").unwrap();
    assert_eq!(words, vec![9, 32768, 4, 32769, 19, 32768, 0]);
  }

  #[test]
  fn labels_comments_and_chars(){
    let text = "
      # print a newline forever
      top:  out '\\n'   # newline
            jmp top
      end:  data 1, 2 end
    ";
    let words = parse_assembly(text).unwrap();
    assert_eq!(words, vec![19, 10, 6, 0, 1, 2, 4]);
  }

  #[test]
  fn forward_reference(){
    let words = parse_assembly("jmp there\nnoop\nthere: halt").unwrap();
    assert_eq!(words, vec![6, 3, 21, 0]);
  }

  #[test]
  fn wrong_arity(){
    match parse_assembly("noop\nadd r0 1") {
      Err(VmError::Assembly { line, .. }) => assert_eq!(line, 2),
      other => panic!("unexpected {:?}", other)
    }
  }

  #[test]
  fn not_an_operation(){
    assert!(matches!(parse_assembly("frob 1"), Err(VmError::Assembly { line: 1, .. })));
  }

  #[test]
  fn undefined_label(){
    assert!(matches!(parse_assembly("\n\njmp nowhere"), Err(VmError::Assembly { line: 3, .. })));
  }

  #[test]
  fn duplicate_label(){
    assert!(matches!(parse_assembly("a: noop\na: noop"), Err(VmError::Assembly { line: 2, .. })));
  }

  #[test]
  fn r8_is_a_label(){
    let words = parse_assembly("r8: jmp r8").unwrap();
    assert_eq!(words, vec![6, 0]);
  }
}
