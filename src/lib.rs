//! `pngpress`: an offline PNG recompressor. Given a raster or an existing
//! PNG, searches color mode, interlace method, per-scanline filter, and
//! deflate level combinations and returns the smallest valid PNG found.
//!
//! Every pixel format derives `bytemuck::Pod`/`Zeroable` instead of
//! hand-writing unsafe impls, and the Adam7/filter paths are written to
//! avoid buffer aliasing entirely rather than reaching for raw pointers, so
//! the whole crate runs under `#![forbid(unsafe_code)]`.
#![forbid(unsafe_code)]

mod adam7;
mod ancillary;
mod candidate;
mod chunk;
mod combo;
mod crc;
mod error;
mod filter;
mod ihdr;
mod image_buffer;
mod interfaces;
mod options;
mod palette;
mod pixel_formats;
mod recompress;
mod report;
mod search;
mod selector;
mod strategy;
mod zlib;

pub use ancillary::AncillaryChunk;
pub use candidate::OptimizationResult;
pub use chunk::Chunk;
pub use error::{PngError, PngResult};
pub use ihdr::{ColorMode, IhdrData, InterlaceMethod};
pub use image_buffer::{ImageBuffer, ImageStats};
pub use interfaces::RasterSource;
pub use options::Options;
pub use strategy::{FilterStrategy, PartitioningParams};
pub use zlib::DeflateLevel;

/// Builds an [`ImageBuffer`] from a host-supplied raster and runs the full
/// combination search, returning the winning [`OptimizationResult`].
pub fn optimize_from_memory(source: RasterSource<'_>, options: &Options) -> PngResult<OptimizationResult> {
  let image = source.to_image_buffer()?;
  let result = search::run(&image, options, &[])?;
  report::trace_winner(&result, result.candidates_considered);
  Ok(result)
}

/// Reads `bytes` as an existing PNG and re-enters the search restricted to
/// filter x deflate-level combinations, preserving every ancillary chunk
/// verbatim.
pub fn optimize(bytes: &[u8], options: &Options) -> PngResult<OptimizationResult> {
  let result = recompress::recompress(bytes, options)?;
  report::trace_winner(&result, result.candidates_considered);
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::interfaces::RasterSource;

  #[test]
  fn optimize_from_memory_roundtrips_a_small_raster() {
    let bgra = [255u8, 0, 0, 255]; // one BGRA pixel: B=255,G=0,R=0,A=255
    let source = RasterSource::new(1, 1, &bgra, 4);
    let result = optimize_from_memory(source, &Options::default()).unwrap();
    assert!(!result.file_bytes.is_empty());
  }

  #[test]
  fn optimize_recompresses_existing_png() {
    let bgra = [0u8, 255, 0, 255, 0, 0, 255, 255]; // 2x1: green, red (BGRA)
    let source = RasterSource::new(2, 1, &bgra, 8);
    let first = optimize_from_memory(source, &Options::default()).unwrap();
    let second = optimize(&first.file_bytes, &Options::default()).unwrap();
    assert!(!second.file_bytes.is_empty());
  }
}
