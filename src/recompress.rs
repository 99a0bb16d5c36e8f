//! Reads an existing PNG, inflates, unfilters/deinterlaces, and re-enters the
//! search restricted to filter x deflate-level (plus an optional
//! non-interlaced-output IHDR clone).

use crate::adam7::deinterlace;
use crate::ancillary::AncillaryChunk;
use crate::chunk::ChunkStream;
use crate::error::{PngError, PngResult};
use crate::filter::{reverse, FilterType};
use crate::ihdr::{IhdrData, InterlaceMethod};
use crate::image_buffer::ImageBuffer;
use crate::options::Options;
use crate::pixel_formats::BGRA8;
use crate::search::{self, OptimizationResult};

/// Reads `bytes` as a PNG, reconstructs its raster, and re-runs the search
/// over filter × deflate-level combinations, preserving every non-core
/// chunk verbatim and emitting a single new IDAT.
pub fn recompress(bytes: &[u8], options: &Options) -> PngResult<OptimizationResult> {
  let stream = ChunkStream::read_all(bytes)?;
  let ihdr_chunk = stream.ihdr_chunk().ok_or(PngError::MissingIhdr)?;
  let ihdr = IhdrData::parse(&ihdr_chunk.data)?;

  let compressed = stream.concatenated_idat();
  let raw_filtered = crate::zlib::inflate(&compressed)?;

  let raster_rows = match ihdr.interlace_method {
    InterlaceMethod::Adam7 => {
      let mut offset = 0usize;
      let total_lines = crate::adam7::total_pass_lines(&ihdr);
      let mut lines: Vec<(u8, &[u8])> = Vec::with_capacity(total_lines);
      for pass_index in 0..7 {
        let (pass_w, pass_h) = crate::adam7::pass_dimensions(ihdr.width, ihdr.height, pass_index);
        if pass_w == 0 || pass_h == 0 {
          continue;
        }
        let stride = ihdr.stride_for_width(pass_w);
        for _ in 0..pass_h {
          let tag = raw_filtered[offset];
          let row = &raw_filtered[offset + 1..offset + 1 + stride];
          lines.push((tag, row));
          offset += 1 + stride;
        }
      }
      deinterlace(&ihdr, lines.into_iter())
    }
    InterlaceMethod::None => unfilter_scanlines(&raw_filtered, &ihdr)?,
  };

  let plte_rgb = if ihdr.color_mode == crate::ihdr::ColorMode::Palette {
    let plte = stream.plte_chunk().ok_or(PngError::UnsupportedFeature("palette image missing PLTE chunk"))?;
    Some(parse_plte(&plte.data)?)
  } else {
    None
  };
  let trns_alpha = if ihdr.color_mode == crate::ihdr::ColorMode::Palette {
    stream.chunks.iter().find(|c| c.chunk_type == *b"tRNS").and_then(|c| {
      match AncillaryChunk::parse(c.chunk_type, &c.data) {
        AncillaryChunk::Transparency(bytes) => Some(bytes),
        AncillaryChunk::Opaque { .. } => None,
      }
    })
  } else {
    None
  };
  let image = rebuild_image_buffer(&raster_rows, &ihdr, plte_rgb.as_deref(), trns_alpha.as_deref())?;

  let mut restricted = options.clone();
  restricted.auto_color_mode = false;
  // The search is restricted to filter x deflate-level: color mode is fixed
  // to whatever the input actually used.
  let preserved = stream.non_core_chunks();

  run_restricted_search(&image, &restricted, ihdr.color_mode, ihdr.bit_depth, ihdr.interlace_method, &preserved)
}

fn unfilter_scanlines(raw_filtered: &[u8], ihdr: &IhdrData) -> PngResult<Vec<Vec<u8>>> {
  let stride = ihdr.stride();
  let bpp = ihdr.bpp();
  let mut offset = 0usize;
  let mut rows = Vec::with_capacity(ihdr.height as usize);
  let mut previous: Vec<u8> = Vec::new();
  for _ in 0..ihdr.height {
    if offset + 1 + stride > raw_filtered.len() {
      return Err(PngError::PrematureEof);
    }
    let tag = raw_filtered[offset];
    let filtered = &raw_filtered[offset + 1..offset + 1 + stride];
    let filter = FilterType::from_tag(tag).ok_or(PngError::UnsupportedFeature("unknown filter tag"))?;
    let mut reconstructed = vec![0u8; stride];
    reverse(filter, filtered, &previous, bpp, &mut reconstructed);
    previous = reconstructed.clone();
    rows.push(reconstructed);
    offset += 1 + stride;
  }
  Ok(rows)
}

/// Parses a `PLTE` chunk payload into `(R,G,B)` triplets: a concatenation of
/// RGB triplets, length divisible by 3, at most 256 entries.
fn parse_plte(data: &[u8]) -> PngResult<Vec<(u8, u8, u8)>> {
  if data.len() % 3 != 0 || data.len() / 3 > 256 {
    return Err(PngError::InvalidIhdrCombination);
  }
  Ok(data.chunks_exact(3).map(|c| (c[0], c[1], c[2])).collect())
}

/// Expands raw scanlines of whatever the input's color mode/bit depth was
/// back into a packed BGRA raster, so the rest of the pipeline (which always
/// works from `ImageBuffer`) doesn't need a second code path. `plte` supplies
/// the palette table for `ColorMode::Palette` inputs; `trns` supplies the
/// per-entry alpha from a `tRNS` chunk, if the input had one (missing entries
/// default to fully opaque, per the PNG `tRNS`-is-a-prefix rule).
fn rebuild_image_buffer(
  rows: &[Vec<u8>], ihdr: &IhdrData, plte: Option<&[(u8, u8, u8)]>, trns: Option<&[u8]>,
) -> PngResult<ImageBuffer> {
  use crate::ihdr::ColorMode;
  let mut pixels = Vec::with_capacity(ihdr.width as usize * ihdr.height as usize);
  for row in rows {
    for x in 0..ihdr.width {
      let pixel = match ihdr.color_mode {
        ColorMode::Grayscale => {
          let v = read_sample_scaled(row, x, ihdr.bit_depth);
          BGRA8::new(v, v, v, 255)
        }
        ColorMode::GrayscaleAlpha => {
          let v = row[x as usize * 2];
          let a = row[x as usize * 2 + 1];
          BGRA8::new(v, v, v, a)
        }
        ColorMode::RGB => {
          let base = x as usize * 3;
          BGRA8::new(row[base], row[base + 1], row[base + 2], 255)
        }
        ColorMode::RGBA => {
          let base = x as usize * 4;
          BGRA8::new(row[base], row[base + 1], row[base + 2], row[base + 3])
        }
        ColorMode::Palette => {
          let plte = plte.expect("rebuild_image_buffer called with Palette color mode but no PLTE table");
          let index = read_sample_scaled_raw(row, x, ihdr.bit_depth) as usize;
          let &(r, g, b) = plte.get(index).ok_or(PngError::InvalidIhdrCombination)?;
          let a = trns.and_then(|t| t.get(index).copied()).unwrap_or(255);
          BGRA8::new(r, g, b, a)
        }
      };
      pixels.push(pixel);
    }
  }
  Ok(ImageBuffer::new(ihdr.width, ihdr.height, pixels))
}

/// Reads one `bit_depth`-wide sample at pixel index `x`, unscaled (the raw
/// value as stored, e.g. a palette index).
fn read_sample_scaled_raw(row: &[u8], x: u32, bit_depth: u8) -> u8 {
  match bit_depth {
    8 => row[x as usize],
    1 | 2 | 4 => {
      let per_byte = 8 / bit_depth as u32;
      let byte_idx = (x / per_byte) as usize;
      let shift_count = x % per_byte;
      let bits = bit_depth as u32;
      let shift = 8 - bits - shift_count * bits;
      let mask = ((1u16 << bits) - 1) as u8;
      (row[byte_idx] >> shift) & mask
    }
    _ => unreachable!("PLTE indices are limited to bit depths {{1,2,4,8}}"),
  }
}

fn read_sample_scaled(row: &[u8], x: u32, bit_depth: u8) -> u8 {
  match bit_depth {
    8 => row[x as usize],
    1 | 2 | 4 => {
      let per_byte = 8 / bit_depth as u32;
      let byte_idx = (x / per_byte) as usize;
      let shift_count = x % per_byte;
      let bits = bit_depth as u32;
      let shift = 8 - bits - shift_count * bits;
      let mask = ((1u16 << bits) - 1) as u8;
      let sample = (row[byte_idx] >> shift) & mask;
      // Scale back up to 0..255 so the rebuilt BGRA raster has full range.
      sample * (255 / mask.max(1))
    }
    16 => row[x as usize * 2],
    _ => unreachable!("PNG bit depths are limited to {{1,2,4,8,16}}"),
  }
}

fn run_restricted_search(
  image: &ImageBuffer, options: &Options, color_mode: crate::ihdr::ColorMode, bit_depth: u8,
  original_interlace: InterlaceMethod, preserved: &[crate::chunk::Chunk],
) -> PngResult<OptimizationResult> {
  use crate::combo::OptimizationCombo;
  use crate::selector::FilterCostModel;
  use crate::strategy::FilterStrategy;
  use crate::zlib::DeflateLevel;

  let filters: Vec<FilterStrategy> = options.effective_filters().into_iter().collect();
  let deflate_levels: Vec<DeflateLevel> = options.effective_deflate_levels().into_iter().collect();
  let interlace_methods: Vec<InterlaceMethod> = if options.interlace {
    vec![InterlaceMethod::None, InterlaceMethod::Adam7]
  } else {
    vec![original_interlace]
  };

  let mut best: Option<OptimizationResult> = None;
  let mut combos_considered = 0usize;
  let params = options.partitioning_params;
  for &interlace_method in &interlace_methods {
    for &filter_strategy in &filters {
      for &deflate_level in &deflate_levels {
        let combo = OptimizationCombo { color_mode, bit_depth, interlace_method, filter_strategy, deflate_level };
        combos_considered += 1;
        let Ok(result) = search::run_single_combo(image, combo, preserved, FilterCostModel::FilteredDelta, &params)
        else {
          continue;
        };
        crate::report::trace_candidate(&result);
        match &best {
          None => best = Some(result),
          Some(current) if result.compressed_size < current.compressed_size => best = Some(result),
          _ => {}
        }
      }
    }
  }
  let mut best = best.ok_or(PngError::AllCandidatesFailed)?;
  best.candidates_considered = combos_considered;
  Ok(best)
}
