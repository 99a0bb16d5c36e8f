//! Zlib/deflate framing: inflate for decode, deflate at a chosen effort
//! level for encode.
//!
//! Wraps [`miniz_oxide`] for both directions. The encode side (`deflate`)
//! is new; only the decode side was previously exercised.

use crate::error::{PngError, PngResult};

/// The five-value deflate effort dial.
///
/// The mapping to a concrete miniz_oxide level is part of the contract, so
/// tests can pin expected behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeflateLevel {
  /// No compression at all (store).
  Fastest,
  /// Fastest non-zero compression.
  Fast,
  /// Library default/optimal balance.
  Default,
  /// Optimal compression.
  Maximum,
  /// Smallest size, slowest.
  Ultra,
}

impl DeflateLevel {
  /// The stable mapping from the five-value dial to a miniz_oxide level
  /// (0-10, where 10 is `CompressionLevel::UberCompression`).
  #[inline]
  pub const fn to_miniz_level(self) -> u8 {
    match self {
      DeflateLevel::Fastest => 0,
      DeflateLevel::Fast => 1,
      DeflateLevel::Default => 6,
      DeflateLevel::Maximum => 9,
      DeflateLevel::Ultra => 10,
    }
  }

  pub const ALL: [DeflateLevel; 5] =
    [DeflateLevel::Fastest, DeflateLevel::Fast, DeflateLevel::Default, DeflateLevel::Maximum, DeflateLevel::Ultra];
}

/// Writes a complete zlib frame (header + deflate + Adler-32) for `bytes` at
/// `level`.
#[inline]
pub fn deflate(bytes: &[u8], level: DeflateLevel) -> Vec<u8> {
  miniz_oxide::deflate::compress_to_vec_zlib(bytes, level.to_miniz_level())
}

/// Reads a complete zlib frame, producing the decoded bytes.
///
/// Fails with [`PngError::CorruptZlib`] if the frame is malformed, or if it
/// decodes to zero bytes from non-empty input.
pub fn inflate(compressed: &[u8]) -> PngResult<Vec<u8>> {
  let out = miniz_oxide::inflate::decompress_to_vec_zlib(compressed).map_err(|_| PngError::CorruptZlib)?;
  if out.is_empty() && !compressed.is_empty() {
    return Err(PngError::CorruptZlib);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roundtrip_all_levels() {
    let data = b"the quick brown fox jumps over the lazy dog, over and over and over".repeat(8);
    for &level in DeflateLevel::ALL.iter() {
      let compressed = deflate(&data, level);
      let decompressed = inflate(&compressed).unwrap();
      assert_eq!(decompressed, data, "level {level:?} failed to roundtrip");
    }
  }

  #[test]
  fn fastest_is_at_least_as_big_as_ultra() {
    let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".repeat(32);
    let fastest = deflate(&data, DeflateLevel::Fastest);
    let ultra = deflate(&data, DeflateLevel::Ultra);
    assert!(ultra.len() <= fastest.len());
  }

  #[test]
  fn corrupt_frame_errors() {
    assert!(inflate(&[0xFF, 0xFF, 0xFF, 0xFF]).is_err());
  }
}
