//! Ancillary chunk passthrough: anything that is not IHDR/PLTE/IDAT/IEND is
//! preserved byte-for-byte across recompression. This module only needs to
//! recognize *which* four-byte tags are known ancillary chunks (for the
//! CRC-tolerance policy in [`crate::chunk`]); it never needs to interpret
//! most of their payloads to round-trip them.

/// The ancillary chunk types defined by the PNG spec (a static allow-list).
const KNOWN_ANCILLARY_TYPES: [[u8; 4]; 16] = [
  *b"tRNS", *b"gAMA", *b"cHRM", *b"sRGB", *b"iCCP", *b"tEXt", *b"zTXt", *b"iTXt",
  *b"bKGD", *b"pHYs", *b"sBIT", *b"sPLT", *b"hIST", *b"tIME", *b"eXIf", *b"acTL",
];

#[inline]
pub fn is_known_ancillary(chunk_type: &[u8; 4]) -> bool {
  KNOWN_ANCILLARY_TYPES.contains(chunk_type)
}

/// A typed view over a preserved ancillary chunk. Recompression never needs
/// more than [`crate::chunk::Chunk`]'s raw bytes to round-trip a chunk, but
/// `tRNS` is opportunistically parsed because the palette quantizer must
/// carry transparency through when it rebuilds `PLTE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncillaryChunk {
  /// Transparency values: per-palette-entry alpha for `Palette`, or a single
  /// key sample (1 or 3 samples) for `Grayscale`/`RGB`.
  Transparency(Vec<u8>),
  /// Anything else, preserved as opaque bytes.
  Opaque { chunk_type: [u8; 4], data: Vec<u8> },
}

impl AncillaryChunk {
  pub fn parse(chunk_type: [u8; 4], data: &[u8]) -> Self {
    if chunk_type == *b"tRNS" {
      AncillaryChunk::Transparency(data.to_vec())
    } else {
      AncillaryChunk::Opaque { chunk_type, data: data.to_vec() }
    }
  }

  pub fn chunk_type(&self) -> [u8; 4] {
    match self {
      AncillaryChunk::Transparency(_) => *b"tRNS",
      AncillaryChunk::Opaque { chunk_type, .. } => *chunk_type,
    }
  }

  pub fn data(&self) -> &[u8] {
    match self {
      AncillaryChunk::Transparency(data) => data,
      AncillaryChunk::Opaque { data, .. } => data,
    }
  }
}
