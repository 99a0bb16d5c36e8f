//! Error taxonomy for the whole crate.
//!
//! Most variants are fatal to whatever operation raised them. An ancillary
//! chunk CRC mismatch has no variant here at all -- it's a `log::warn!` and
//! parsing continues -- and `CombinationInfeasible`/`CandidateInternalError`
//! are local to one candidate rather than aborting the whole run.

use thiserror::Error;

pub type PngResult<T> = Result<T, PngError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PngError {
  #[error("input does not start with the PNG signature")]
  BadSignature,

  #[error("chunk stream ended before a complete chunk could be read")]
  PrematureEof,

  #[error("chunk declared a length that overflows the remaining input")]
  LengthOverflow,

  #[error("the first chunk in the stream was not IHDR")]
  MissingIhdr,

  #[error("no IDAT chunk was present in the stream")]
  MissingIdat,

  #[error("IEND was not the final chunk in the stream")]
  IendNotLast,

  #[error(
    "IHDR declared an invalid color_type/bit_depth/width/height/compression/filter combination"
  )]
  InvalidIhdrCombination,

  #[error("a critical chunk ({}) failed its CRC check", String::from_utf8_lossy(.chunk_type))]
  CrcMismatchCritical { chunk_type: [u8; 4] },

  #[error("the zlib/deflate stream was malformed or produced no bytes from non-empty input")]
  CorruptZlib,

  #[error("unsupported color type, bit depth, or feature: {0}")]
  UnsupportedFeature(&'static str),

  #[error("this combination of color mode/bit depth/strategy cannot be encoded")]
  CombinationInfeasible,

  #[error("a candidate failed internally and was dropped from the search: {0}")]
  CandidateInternalError(&'static str),

  #[error("every enumerated candidate failed or was infeasible")]
  AllCandidatesFailed,

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl PngError {
  /// True for chunk-stream-level errors that abort the whole stream, rather
  /// than a single ancillary chunk's CRC mismatch.
  pub fn is_critical(&self) -> bool {
    matches!(
      self,
      PngError::BadSignature
        | PngError::PrematureEof
        | PngError::LengthOverflow
        | PngError::MissingIhdr
        | PngError::MissingIdat
        | PngError::IendNotLast
        | PngError::InvalidIhdrCombination
        | PngError::CrcMismatchCritical { .. }
    )
  }
}
