//! Adam7: seven-pass interlace geometry, per-pass unfilter, and
//! scatter/gather between the full raster and each reduced pass image.
//!
//! The decode direction unfilters each pass in place and places every pixel
//! back into the full raster via [`scatter_pass`]; the encode direction
//! mirrors that structure to gather and filter each pass via [`gather_pass`].

use crate::filter::{apply, reverse, FilterType};
use crate::ihdr::IhdrData;

/// `(startRow, startCol, rowInc, colInc)` for each of the seven passes.
pub const PASSES: [(u32, u32, u32, u32); 7] =
  [(0, 0, 8, 8), (0, 4, 8, 8), (4, 0, 8, 4), (0, 2, 4, 4), (2, 0, 4, 2), (0, 1, 2, 2), (1, 0, 2, 1)];

#[inline]
fn ceil_div(n: u32, d: u32) -> u32 {
  if n == 0 {
    0
  } else {
    (n - 1) / d + 1
  }
}

/// `passW = ceil((W - startCol) / colInc)`, `passH = ceil((H - startRow) / rowInc)`.
/// Passes whose start offset is beyond the image bounds contribute 0.
pub fn pass_dimensions(width: u32, height: u32, pass_index: usize) -> (u32, u32) {
  let (start_row, start_col, row_inc, col_inc) = PASSES[pass_index];
  let w = if width > start_col { ceil_div(width - start_col, col_inc) } else { 0 };
  let h = if height > start_row { ceil_div(height - start_row, row_inc) } else { 0 };
  (w, h)
}

/// Extracts one sample (packed according to `bit_depth`) from a raw scanline
/// at pixel index `x`, returning it left-aligned in the low bits of a byte
/// for sub-8-bit depths, or the raw `bpp`-byte sample otherwise.
fn read_sample<'a>(row: &'a [u8], x: u32, bit_depth: u8, bpp: usize) -> [u8; 8] {
  let mut out = [0u8; 8];
  match bit_depth {
    1 | 2 | 4 => {
      let per_byte = 8 / bit_depth as u32;
      let byte_idx = (x / per_byte) as usize;
      let shift_count = x % per_byte;
      let bits = bit_depth as u32;
      let shift = 8 - bits - shift_count * bits;
      let mask = ((1u16 << bits) - 1) as u8;
      out[0] = (row[byte_idx] >> shift) & mask;
    }
    _ => {
      let start = x as usize * bpp;
      out[..bpp].copy_from_slice(&row[start..start + bpp]);
    }
  }
  out
}

fn write_sample(row: &mut [u8], x: u32, bit_depth: u8, bpp: usize, sample: &[u8]) {
  match bit_depth {
    1 | 2 | 4 => {
      let per_byte = 8 / bit_depth as u32;
      let byte_idx = (x / per_byte) as usize;
      let shift_count = x % per_byte;
      let bits = bit_depth as u32;
      let shift = 8 - bits - shift_count * bits;
      let mask = ((1u16 << bits) - 1) as u8;
      row[byte_idx] = (row[byte_idx] & !(mask << shift)) | ((sample[0] & mask) << shift);
    }
    _ => {
      let start = x as usize * bpp;
      row[start..start + bpp].copy_from_slice(&sample[..bpp]);
    }
  }
}

/// Gathers one reduced-pass image's raw (unfiltered) scanlines out of the
/// full raster. `full_stride` is the full image's raw stride; `full_rows` are
/// the full raster's raw scanlines. Returns raw (unfiltered) pass scanlines.
pub fn gather_pass(
  full_rows: &[Vec<u8>], ihdr: &IhdrData, pass_index: usize,
) -> Vec<Vec<u8>> {
  let bit_depth = ihdr.bit_depth;
  let bpp = ihdr.bpp();
  let sample_bytes = bpp;
  let (start_row, start_col, row_inc, col_inc) = PASSES[pass_index];
  let (pass_w, pass_h) = pass_dimensions(ihdr.width, ihdr.height, pass_index);
  if pass_w == 0 || pass_h == 0 {
    return Vec::new();
  }
  let stride = ihdr.stride_for_width(pass_w);
  let mut out = Vec::with_capacity(pass_h as usize);
  for py in 0..pass_h {
    let full_y = start_row + py * row_inc;
    let full_row = &full_rows[full_y as usize];
    let mut row = vec![0u8; stride];
    for px in 0..pass_w {
      let full_x = start_col + px * col_inc;
      let sample = read_sample(full_row, full_x, bit_depth, sample_bytes);
      write_sample(&mut row, px, bit_depth, sample_bytes, &sample);
    }
    out.push(row);
  }
  out
}

/// Scatters one reduced-pass image's raw (unfiltered) scanlines back into
/// the full raster.
pub fn scatter_pass(
  full_rows: &mut [Vec<u8>], ihdr: &IhdrData, pass_index: usize, pass_rows: &[Vec<u8>],
) {
  let bit_depth = ihdr.bit_depth;
  let bpp = ihdr.bpp();
  let (start_row, start_col, row_inc, col_inc) = PASSES[pass_index];
  let (pass_w, _pass_h) = pass_dimensions(ihdr.width, ihdr.height, pass_index);
  for (py, row) in pass_rows.iter().enumerate() {
    let full_y = start_row + (py as u32) * row_inc;
    let full_row = &mut full_rows[full_y as usize];
    for px in 0..pass_w {
      let full_x = start_col + px * col_inc;
      let sample = read_sample(row, px, bit_depth, bpp);
      write_sample(full_row, full_x, bit_depth, bpp, &sample);
    }
  }
}

/// Encodes the full raster into Adam7 pass order: for each of the 7 passes
/// (skipping empty ones), filters every row of that pass with `choose_pass_filters`,
/// and appends `(filter_tag, filtered_bytes)` pairs in pass order.
pub fn interlace_and_filter<Fsel>(
  full_rows: &[Vec<u8>], ihdr: &IhdrData, mut choose_pass_filters: Fsel,
) -> Vec<(FilterType, Vec<u8>)>
where
  Fsel: FnMut(usize, &[&[u8]]) -> Vec<FilterType>,
{
  let mut out = Vec::new();
  for pass_index in 0..7 {
    let (pass_w, pass_h) = pass_dimensions(ihdr.width, ihdr.height, pass_index);
    if pass_w == 0 || pass_h == 0 {
      continue;
    }
    let pass_rows = gather_pass(full_rows, ihdr, pass_index);
    let row_refs: Vec<&[u8]> = pass_rows.iter().map(|r| r.as_slice()).collect();
    let filters = choose_pass_filters(pass_index, &row_refs);
    debug_assert_eq!(filters.len(), pass_rows.len());

    let mut previous: &[u8] = &[];
    let mut scratch = vec![0u8; ihdr.stride_for_width(pass_w)];
    for (row, &filter) in pass_rows.iter().zip(filters.iter()) {
      apply(filter, row, previous, ihdr.bpp(), &mut scratch);
      out.push((filter, scratch.clone()));
      previous = row;
    }
  }
  out
}

/// Decodes Adam7-interlaced, already-unfiltered-per-byte-stream data: `lines`
/// yields `(filter_tag, filtered_row)` pairs in pass order (exactly as they
/// appear concatenated in the decompressed IDAT stream). Returns the
/// full-size raw raster, one `Vec<u8>` scanline per row.
pub fn deinterlace<'a>(
  ihdr: &IhdrData, mut lines: impl Iterator<Item = (u8, &'a [u8])>,
) -> Vec<Vec<u8>> {
  let full_stride = ihdr.stride();
  let mut full_rows: Vec<Vec<u8>> = (0..ihdr.height).map(|_| vec![0u8; full_stride]).collect();

  for pass_index in 0..7 {
    let (pass_w, pass_h) = pass_dimensions(ihdr.width, ihdr.height, pass_index);
    if pass_w == 0 || pass_h == 0 {
      continue;
    }
    let stride = ihdr.stride_for_width(pass_w);
    let mut previous: Vec<u8> = Vec::new();
    let mut pass_rows: Vec<Vec<u8>> = Vec::with_capacity(pass_h as usize);
    for _ in 0..pass_h {
      let (tag, filtered) = lines.next().expect("Adam7 line iterator exhausted early");
      debug_assert_eq!(filtered.len(), stride);
      let filter = FilterType::from_tag(tag).unwrap_or(FilterType::None);
      let mut reconstructed = vec![0u8; stride];
      reverse(filter, filtered, &previous, ihdr.bpp(), &mut reconstructed);
      previous = reconstructed.clone();
      pass_rows.push(reconstructed);
    }
    scatter_pass(&mut full_rows, ihdr, pass_index, &pass_rows);
  }
  full_rows
}

/// Total count of `(filter-tag + filtered-row)` pairs an Adam7 stream has for
/// this header, i.e. the sum of each non-empty pass's height.
pub fn total_pass_lines(ihdr: &IhdrData) -> usize {
  (0..7).map(|p| pass_dimensions(ihdr.width, ihdr.height, p).1 as usize).sum()
}
