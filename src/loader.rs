//! Populates memory from a binary image before the first fetch.

use std::fs;
use std::path::Path;

use log::info;

use crate::address::MEMORY_SIZE;
use crate::bytecode::decode_image;
use crate::error::VmError;
use crate::memory::AddressSpace;

/**
  Writes the image's n-th little-endian word to memory address n, starting at 0. Returns the number
  of words loaded. Memory past the image is left as it was (zero on a fresh `AddressSpace`).
*/
pub fn load_image(space: &mut AddressSpace, bytes: &[u8]) -> Result<usize, VmError> {
  let words = decode_image(bytes);
  if words.len() > MEMORY_SIZE {
    return Err(VmError::ImageTooLarge { words: words.len() });
  }
  space.fill(&words);
  Ok(words.len())
}

pub fn load_file(space: &mut AddressSpace, path: &Path) -> Result<usize, VmError> {
  info!("Loading file {}", path.display());
  let bytes = fs::read(path)?;
  let words = load_image(space, &bytes)?;
  info!("Finished loading file {} ({} words)", path.display(), words);
  Ok(words)
}
