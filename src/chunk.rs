//! Chunk codec: read/write of `{length, type, data, crc}` chunks, signature
//! check, and chunk-list assembly.
//!
//! Chunks are read by walking the length-prefixed, CRC-suffixed stream one
//! chunk at a time; CRC verification goes through [`crate::crc`].

use log::warn;

use crate::ancillary::is_known_ancillary;
use crate::crc::chunk_crc;
use crate::error::{PngError, PngResult};

pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// One raw, owned PNG chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
  pub chunk_type: [u8; 4],
  pub data: Vec<u8>,
}

impl Chunk {
  #[inline]
  pub fn new(chunk_type: [u8; 4], data: Vec<u8>) -> Self {
    Self { chunk_type, data }
  }

  #[inline]
  pub fn type_str(&self) -> &str {
    std::str::from_utf8(&self.chunk_type).unwrap_or("????")
  }

  /// A critical chunk has its type's first letter uppercase.
  #[inline]
  pub fn is_critical(&self) -> bool {
    self.chunk_type[0].is_ascii_uppercase()
  }

  #[inline]
  pub fn crc(&self) -> u32 {
    chunk_crc(self.chunk_type, &self.data)
  }
}

/// An ordered sequence of chunks read from (or to be written to) a PNG
/// stream.
#[derive(Debug, Clone)]
pub struct ChunkStream {
  pub chunks: Vec<Chunk>,
}

impl ChunkStream {
  /// Verifies the signature, then reads chunks until `IEND`. Tolerates CRC
  /// mismatches on known ancillary chunks (warns and keeps the chunk's
  /// declared data); a CRC mismatch on a critical chunk is fatal.
  pub fn read_all(bytes: &[u8]) -> PngResult<Self> {
    if bytes.len() < 8 || bytes[..8] != PNG_SIGNATURE {
      return Err(PngError::BadSignature);
    }
    let mut rest = &bytes[8..];
    let mut chunks = Vec::new();
    let mut saw_ihdr_first = false;
    let mut saw_idat = false;
    let mut iend_index = None;

    loop {
      if rest.len() < 8 {
        return Err(PngError::PrematureEof);
      }
      let length = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
      let chunk_type: [u8; 4] = rest[4..8].try_into().unwrap();
      let total = 8usize
        .checked_add(length)
        .and_then(|n| n.checked_add(4))
        .ok_or(PngError::LengthOverflow)?;
      if rest.len() < total {
        return Err(PngError::LengthOverflow);
      }
      let data = rest[8..8 + length].to_vec();
      let declared_crc = u32::from_be_bytes(rest[8 + length..8 + length + 4].try_into().unwrap());
      rest = &rest[total..];

      let actual_crc = chunk_crc(chunk_type, &data);
      if actual_crc != declared_crc {
        let is_critical = chunk_type[0].is_ascii_uppercase();
        if is_critical {
          return Err(PngError::CrcMismatchCritical { chunk_type });
        } else if is_known_ancillary(&chunk_type) {
          warn!(
            "ancillary chunk {:?} failed CRC check (declared {:08x}, computed {:08x}); tolerating",
            std::str::from_utf8(&chunk_type).unwrap_or("????"),
            declared_crc,
            actual_crc
          );
        } else {
          warn!("unknown ancillary chunk {:?} failed CRC check; tolerating", chunk_type);
        }
      }

      if chunks.is_empty() {
        saw_ihdr_first = chunk_type == *b"IHDR";
      }
      if chunk_type == *b"IDAT" {
        saw_idat = true;
      }
      let is_iend = chunk_type == *b"IEND";

      chunks.push(Chunk::new(chunk_type, data));

      if is_iend {
        iend_index = Some(chunks.len() - 1);
        break;
      }
      if rest.is_empty() {
        return Err(PngError::PrematureEof);
      }
    }

    if !saw_ihdr_first {
      return Err(PngError::MissingIhdr);
    }
    if !saw_idat {
      return Err(PngError::MissingIdat);
    }
    if iend_index != Some(chunks.len() - 1) {
      return Err(PngError::IendNotLast);
    }

    Ok(Self { chunks })
  }

  /// Emits signature, then each chunk as `length ∥ type ∥ data ∥ crc`.
  pub fn write(&self) -> Vec<u8> {
    let total_len: usize = 8 + self.chunks.iter().map(|c| 12 + c.data.len()).sum::<usize>();
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&PNG_SIGNATURE);
    for chunk in &self.chunks {
      out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
      out.extend_from_slice(&chunk.chunk_type);
      out.extend_from_slice(&chunk.data);
      out.extend_from_slice(&chunk.crc().to_be_bytes());
    }
    out
  }

  /// Concatenates the payloads of all `IDAT` chunks in their original order.
  pub fn concatenated_idat(&self) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in &self.chunks {
      if chunk.chunk_type == *b"IDAT" {
        out.extend_from_slice(&chunk.data);
      }
    }
    out
  }

  /// All chunks other than IHDR/PLTE/IDAT/IEND, in their original order --
  /// preserved verbatim when a stream is reassembled. PLTE is excluded
  /// because a new PLTE is always rebuilt from the chosen palette; keeping
  /// the original alongside it would produce two PLTE chunks.
  pub fn non_core_chunks(&self) -> Vec<Chunk> {
    self
      .chunks
      .iter()
      .filter(|c| !matches!(&c.chunk_type, b"IHDR" | b"PLTE" | b"IDAT" | b"IEND"))
      .cloned()
      .collect()
  }

  pub fn ihdr_chunk(&self) -> Option<&Chunk> {
    self.chunks.iter().find(|c| c.chunk_type == *b"IHDR")
  }

  pub fn plte_chunk(&self) -> Option<&Chunk> {
    self.chunks.iter().find(|c| c.chunk_type == *b"PLTE")
  }
}

/// Assembles a fresh `ChunkStream` from an IHDR payload, an optional PLTE
/// payload, a single new IDAT payload, and the preserved ancillary chunks,
/// ensuring IHDR is first, IDAT comes after PLTE/ancillaries, and IEND is
/// last.
pub fn assemble(
  ihdr_payload: [u8; 13], plte_payload: Option<Vec<u8>>, idat_payload: Vec<u8>,
  preserved: Vec<Chunk>,
) -> ChunkStream {
  let mut chunks = Vec::with_capacity(preserved.len() + 4);
  chunks.push(Chunk::new(*b"IHDR", ihdr_payload.to_vec()));
  if let Some(plte) = plte_payload {
    chunks.push(Chunk::new(*b"PLTE", plte));
  }
  for chunk in preserved {
    chunks.push(chunk);
  }
  chunks.push(Chunk::new(*b"IDAT", idat_payload));
  chunks.push(Chunk::new(*b"IEND", Vec::new()));
  ChunkStream { chunks }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tiny_valid_png() -> Vec<u8> {
    // 1x1 RGB8, filter None, raw pixel [10, 20, 30].
    let ihdr_payload: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0];
    let filtered = vec![0u8, 10, 20, 30];
    let compressed = crate::zlib::deflate(&filtered, crate::zlib::DeflateLevel::Default);
    assemble(ihdr_payload, None, compressed, Vec::new()).write()
  }

  #[test]
  fn roundtrip_write_then_read() {
    let bytes = tiny_valid_png();
    let stream = ChunkStream::read_all(&bytes).unwrap();
    assert_eq!(stream.chunks.first().unwrap().chunk_type, *b"IHDR");
    assert_eq!(stream.chunks.last().unwrap().chunk_type, *b"IEND");
    assert!(stream.chunks.iter().any(|c| c.chunk_type == *b"IDAT"));
    let rewritten = stream.write();
    assert_eq!(rewritten, bytes);
  }

  #[test]
  fn rejects_bad_signature() {
    let mut bytes = tiny_valid_png();
    bytes[0] = 0;
    assert!(matches!(ChunkStream::read_all(&bytes), Err(PngError::BadSignature)));
  }

  #[test]
  fn rejects_missing_idat() {
    let ihdr_payload: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0];
    let bytes = ChunkStream {
      chunks: vec![Chunk::new(*b"IHDR", ihdr_payload.to_vec()), Chunk::new(*b"IEND", Vec::new())],
    }
    .write();
    assert!(matches!(ChunkStream::read_all(&bytes), Err(PngError::MissingIdat)));
  }

  #[test]
  fn rejects_critical_crc_mismatch() {
    let mut bytes = tiny_valid_png();
    // Corrupt a byte inside the IHDR chunk's data (offset 8 is the first data
    // byte after the 8-byte length+type header).
    bytes[8 + 8] ^= 0xFF;
    assert!(matches!(ChunkStream::read_all(&bytes), Err(PngError::CrcMismatchCritical { .. })));
  }

  #[test]
  fn tolerates_ancillary_crc_mismatch() {
    let ihdr_payload: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0];
    let filtered = vec![0u8, 10, 20, 30];
    let compressed = crate::zlib::deflate(&filtered, crate::zlib::DeflateLevel::Default);
    let gama_chunk = Chunk::new(*b"gAMA", vec![0, 0, 0x9a, 0xca]);
    let stream = assemble(ihdr_payload, None, compressed, vec![gama_chunk.clone()]);
    let mut bytes = stream.write();
    let gama_pos = bytes.windows(4).position(|w| w == b"gAMA").unwrap();
    let crc_pos = gama_pos + 4 + gama_chunk.data.len();
    bytes[crc_pos] ^= 0xFF;
    let stream = ChunkStream::read_all(&bytes).unwrap();
    assert!(stream.chunks.iter().any(|c| c.chunk_type == *b"gAMA"));
  }
}
