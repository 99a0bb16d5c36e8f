//! Given one `OptimizationCombo`, converts the shared `ImageBuffer`, chooses
//! filters, deflates, and serializes a fully-framed PNG byte string.

use crate::adam7::{interlace_and_filter, total_pass_lines};
use crate::chunk::{assemble, Chunk};
use crate::combo::OptimizationCombo;
use crate::error::{PngError, PngResult};
use crate::filter::{apply, FilterType};
use crate::ihdr::{ColorMode, IhdrData, InterlaceMethod};
use crate::image_buffer::ImageBuffer;
use crate::palette::Palette;
use crate::selector::FilterCostModel;
use crate::strategy::{choose_filters, count_filter_transitions, PartitioningParams};
use crate::zlib::deflate;

#[derive(Debug, Clone)]
pub struct OptimizationResult {
  pub combo: OptimizationCombo,
  pub compressed_size: usize,
  pub filters: Vec<FilterType>,
  pub filter_transitions: usize,
  pub file_bytes: Vec<u8>,
  pub processing_time: std::time::Duration,
  /// How many candidates the search that produced this result enumerated in
  /// total. Set to `1` here and overwritten by the caller (`search::run`,
  /// `recompress::run_restricted_search`) once the full count is known.
  pub candidates_considered: usize,
}

/// Runs one candidate to completion. `preserved_chunks` are the ancillary
/// chunks carried through verbatim; empty for a fresh encode from a raster.
/// A fresh `tRNS` is synthesized from the built palette's alpha values for
/// `ColorMode::Palette`, and any stale `tRNS` already in `preserved_chunks`
/// is dropped so it isn't duplicated.
pub fn run(
  image: &ImageBuffer, combo: OptimizationCombo, preserved_chunks: &[Chunk],
  cost_model: FilterCostModel, params: &PartitioningParams,
) -> PngResult<OptimizationResult> {
  let started = std::time::Instant::now();

  if combo.color_mode == ColorMode::Palette
    && combo.bit_depth < 8
    && combo.filter_strategy != crate::strategy::FilterStrategy::SingleFilter
  {
    return Err(PngError::CombinationInfeasible);
  }

  let palette = if combo.color_mode == ColorMode::Palette {
    Some(Palette::build(image, 256))
  } else {
    None
  };

  let scanlines = image.to_scanlines(combo.color_mode, combo.bit_depth, palette.as_ref());

  let ihdr = IhdrData {
    width: image.width,
    height: image.height,
    bit_depth: combo.bit_depth,
    color_mode: combo.color_mode,
    interlace_method: combo.interlace_method,
  };

  let (filters, filtered_bytes) = match combo.interlace_method {
    InterlaceMethod::None => filter_non_interlaced(&scanlines, &ihdr, combo, cost_model, params),
    InterlaceMethod::Adam7 => filter_interlaced(&scanlines, &ihdr, combo, cost_model, params),
  };

  let compressed = deflate(&filtered_bytes, combo.deflate_level);

  let plte_payload = palette.as_ref().map(|p| p.to_plte_payload());
  let mut chunks_before_idat: Vec<Chunk> = if palette.is_some() {
    preserved_chunks.iter().filter(|c| c.chunk_type != *b"tRNS").cloned().collect()
  } else {
    preserved_chunks.to_vec()
  };
  if let Some(trns) = palette.as_ref().and_then(|p| p.to_trns_payload()) {
    chunks_before_idat.insert(0, Chunk::new(*b"tRNS", trns));
  }
  let stream = assemble(ihdr.serialize(), plte_payload, compressed, chunks_before_idat);
  let file_bytes = stream.write();

  Ok(OptimizationResult {
    combo,
    compressed_size: file_bytes.len(),
    filter_transitions: count_filter_transitions(&filters),
    filters,
    file_bytes,
    processing_time: started.elapsed(),
    candidates_considered: 1,
  })
}

fn filter_non_interlaced(
  scanlines: &[Vec<u8>], ihdr: &IhdrData, combo: OptimizationCombo, cost_model: FilterCostModel,
  params: &PartitioningParams,
) -> (Vec<FilterType>, Vec<u8>) {
  let bpp = ihdr.bpp();
  let row_refs: Vec<&[u8]> = scanlines.iter().map(|r| r.as_slice()).collect();
  let filters = choose_filters(
    combo.filter_strategy,
    &row_refs,
    bpp,
    combo.color_mode,
    combo.bit_depth,
    cost_model,
    params,
  );

  let stride = ihdr.stride();
  let mut out = Vec::with_capacity(scanlines.len() * (stride + 1));
  let mut scratch = vec![0u8; stride];
  let mut previous: &[u8] = &[];
  for (row, &filter) in scanlines.iter().zip(filters.iter()) {
    apply(filter, row, previous, bpp, &mut scratch);
    out.push(filter.tag());
    out.extend_from_slice(&scratch);
    previous = row;
  }
  (filters, out)
}

fn filter_interlaced(
  scanlines: &[Vec<u8>], ihdr: &IhdrData, combo: OptimizationCombo, cost_model: FilterCostModel,
  params: &PartitioningParams,
) -> (Vec<FilterType>, Vec<u8>) {
  let bpp = ihdr.bpp();
  let strategy = combo.filter_strategy;
  let color_mode = combo.color_mode;
  let bit_depth = combo.bit_depth;

  let encoded = interlace_and_filter(scanlines, ihdr, |_pass_index, pass_rows| {
    choose_filters(strategy, pass_rows, bpp, color_mode, bit_depth, cost_model, params)
  });

  debug_assert_eq!(encoded.len(), total_pass_lines(ihdr));
  let mut filters = Vec::with_capacity(encoded.len());
  let mut out = Vec::new();
  for (filter, filtered_row) in encoded {
    filters.push(filter);
    out.push(filter.tag());
    out.extend_from_slice(&filtered_row);
  }
  (filters, out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ihdr::InterlaceMethod;
  use crate::pixel_formats::BGRA8;
  use crate::strategy::FilterStrategy;
  use crate::zlib::{inflate, DeflateLevel};

  fn combo(
    color_mode: ColorMode, bit_depth: u8, interlace: InterlaceMethod, strategy: FilterStrategy,
  ) -> OptimizationCombo {
    OptimizationCombo {
      color_mode,
      bit_depth,
      interlace_method: interlace,
      filter_strategy: strategy,
      deflate_level: DeflateLevel::Default,
    }
  }

  #[test]
  fn single_pixel_rgb_roundtrips_through_deflate() {
    let image = ImageBuffer::new(1, 1, vec![BGRA8::new(255, 0, 0, 255)]);
    let result = run(
      &image,
      combo(ColorMode::RGB, 8, InterlaceMethod::None, FilterStrategy::SingleFilter),
      &[],
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    )
    .unwrap();
    assert_eq!(result.filters, vec![FilterType::None]);

    let stream = crate::chunk::ChunkStream::read_all(&result.file_bytes).unwrap();
    let idat = stream.concatenated_idat();
    let raw = inflate(&idat).unwrap();
    assert_eq!(raw, vec![0, 255, 0, 0]);
  }

  #[test]
  fn sub_byte_palette_with_non_single_filter_is_infeasible() {
    let image = ImageBuffer::new(2, 1, vec![BGRA8::new(0, 0, 0, 255), BGRA8::new(1, 1, 1, 255)]);
    let result = run(
      &image,
      combo(ColorMode::Palette, 4, InterlaceMethod::None, FilterStrategy::ScanlineAdaptive),
      &[],
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    );
    assert!(matches!(result, Err(PngError::CombinationInfeasible)));
  }

  #[test]
  fn interlaced_candidate_produces_valid_stream() {
    let pixels: Vec<BGRA8> =
      (0..16).map(|i| BGRA8::new(i as u8, (i * 2) as u8, (i * 3) as u8, 255)).collect();
    let image = ImageBuffer::new(4, 4, pixels);
    let result = run(
      &image,
      combo(ColorMode::RGB, 8, InterlaceMethod::Adam7, FilterStrategy::ScanlineAdaptive),
      &[],
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    )
    .unwrap();
    let stream = crate::chunk::ChunkStream::read_all(&result.file_bytes).unwrap();
    assert_eq!(stream.ihdr_chunk().unwrap().data[12], 1);
  }

  #[test]
  fn preserved_chunks_survive_in_output() {
    let image = ImageBuffer::new(1, 1, vec![BGRA8::new(10, 20, 30, 255)]);
    let preserved = vec![Chunk::new(*b"tEXt", b"Author\0me".to_vec())];
    let result = run(
      &image,
      combo(ColorMode::RGB, 8, InterlaceMethod::None, FilterStrategy::SingleFilter),
      &preserved,
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    )
    .unwrap();
    let stream = crate::chunk::ChunkStream::read_all(&result.file_bytes).unwrap();
    assert!(stream.chunks.iter().any(|c| c.chunk_type == *b"tEXt"));
  }
}
