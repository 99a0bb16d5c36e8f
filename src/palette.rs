//! Palette quantizer: two-phase collect-then-nearest-match RGBA palette
//! construction, built while converting an [`crate::image_buffer::ImageBuffer`]
//! to `ColorMode::Palette` scanlines.

use std::collections::HashMap;

use crate::image_buffer::ImageBuffer;

#[inline]
pub fn bit_depth_for_colors(n: usize) -> u8 {
  if n <= 2 {
    1
  } else if n <= 4 {
    2
  } else if n <= 16 {
    4
  } else {
    8
  }
}

/// A built palette: up to `max_colors` `(R,G,B,A)` entries in first-seen
/// order, plus the lookup map used for pixels whose exact color made it in.
/// Alpha is part of the quantization key so a recompressed palette image
/// keeps its transparency instead of silently going opaque.
#[derive(Debug, Clone)]
pub struct Palette {
  pub entries: Vec<(u8, u8, u8, u8)>,
  index_by_key: HashMap<u32, u8>,
}

impl Palette {
  /// Phase one: walk `image` row-major, recording up to `max_colors` distinct
  /// RGBA colors in first-seen order.
  pub fn build(image: &ImageBuffer, max_colors: usize) -> Self {
    let mut entries = Vec::new();
    let mut index_by_key = HashMap::new();
    'outer: for y in 0..image.height {
      for &p in image.row(y) {
        let key = key_of(p.r, p.g, p.b, p.a);
        if index_by_key.contains_key(&key) {
          continue;
        }
        if entries.len() >= max_colors {
          break 'outer;
        }
        index_by_key.insert(key, entries.len() as u8);
        entries.push((p.r, p.g, p.b, p.a));
      }
    }
    Self { entries, index_by_key }
  }

  /// Phase two, per pixel: exact match from phase one if present, otherwise
  /// nearest palette entry by squared Euclidean RGB distance (alpha ignored
  /// for the nearest-match fallback), ties broken by lowest index.
  pub fn index_for(&self, r: u8, g: u8, b: u8, a: u8) -> u8 {
    let key = key_of(r, g, b, a);
    if let Some(&idx) = self.index_by_key.get(&key) {
      return idx;
    }
    let mut best_idx = 0u8;
    let mut best_dist = u32::MAX;
    for (idx, &(pr, pg, pb, _pa)) in self.entries.iter().enumerate() {
      let dr = r as i32 - pr as i32;
      let dg = g as i32 - pg as i32;
      let db = b as i32 - pb as i32;
      let dist = (dr * dr + dg * dg + db * db) as u32;
      if dist < best_dist {
        best_dist = dist;
        best_idx = idx as u8;
      }
    }
    best_idx
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Serializes to a `PLTE` chunk payload: 3 bytes per entry, in order.
  pub fn to_plte_payload(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(self.entries.len() * 3);
    for &(r, g, b, _a) in &self.entries {
      out.push(r);
      out.push(g);
      out.push(b);
    }
    out
  }

  /// Serializes to a `tRNS` chunk payload: one alpha byte per entry, with
  /// trailing fully-opaque entries omitted (PNG allows a `tRNS` shorter than
  /// `PLTE`, implying 255 for the missing tail). Returns `None` when every
  /// entry is fully opaque, since the image then needs no `tRNS` at all.
  pub fn to_trns_payload(&self) -> Option<Vec<u8>> {
    let mut alphas: Vec<u8> = self.entries.iter().map(|&(_, _, _, a)| a).collect();
    while alphas.last() == Some(&255) {
      alphas.pop();
    }
    if alphas.is_empty() {
      None
    } else {
      Some(alphas)
    }
  }
}

#[inline]
fn key_of(r: u8, g: u8, b: u8, a: u8) -> u32 {
  ((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32
}
