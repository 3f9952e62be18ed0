/*!
  This module is responsible for the encoding and decoding of binary images.

*/

use crate::address::Word;

/**
  Splits a byte stream into little-endian words. A dangling final byte, which can only come from a
  malformed image, is dropped.
*/
pub fn decode_image(bytes: &[u8]) -> Vec<Word> {
  bytes
    .chunks_exact(2)
    .map(|pair| Word::from_le_bytes([pair[0], pair[1]]))
    .collect()
}

/// The inverse of `decode_image`.
pub fn encode_image(words: &[Word]) -> Vec<u8> {
  words.iter().flat_map(|w| w.to_le_bytes()).collect()
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn little_endian(){
    assert_eq!(decode_image(&[0x09, 0x00, 0x00, 0x80]), vec![9, 32768]);
    assert_eq!(encode_image(&[32775]), vec![0x07, 0x80]);
  }

  #[test]
  fn odd_length_truncates(){
    assert_eq!(decode_image(&[0x13, 0x00, 0xFF]), vec![19]);
    assert!(decode_image(&[0xFF]).is_empty());
  }
}
