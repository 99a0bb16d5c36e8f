//! Combination enumeration: builds the auto-color-mode ladder and takes its
//! Cartesian product with interlace method, filter strategy, and deflate
//! level to produce the full set of `OptimizationCombo`s to try.

use indexmap::IndexSet;

use crate::ihdr::{ColorMode, InterlaceMethod};
use crate::image_buffer::ImageStats;
use crate::options::Options;
use crate::palette::bit_depth_for_colors;
use crate::strategy::FilterStrategy;
use crate::zlib::DeflateLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationCombo {
  pub color_mode: ColorMode,
  pub bit_depth: u8,
  pub interlace_method: InterlaceMethod,
  pub filter_strategy: FilterStrategy,
  pub deflate_level: DeflateLevel,
}

/// The `(ColorMode, BitDepth)` ladder to try, before the Cartesian product
/// with interlace/filter-strategy/deflate-level.
fn color_mode_ladder(stats: &ImageStats, options: &Options) -> Vec<(ColorMode, u8)> {
  if !options.auto_color_mode {
    return if stats.has_alpha { vec![(ColorMode::RGBA, 8)] } else { vec![(ColorMode::RGB, 8)] };
  }

  let mut ladder = Vec::new();
  if stats.is_grayscale && stats.has_alpha {
    ladder.push((ColorMode::GrayscaleAlpha, 8));
  } else if stats.is_grayscale {
    ladder.push((ColorMode::Grayscale, 8));
    if stats.unique_colors <= 16 {
      ladder.push((ColorMode::Grayscale, 4));
    }
    if stats.unique_colors <= 4 {
      ladder.push((ColorMode::Grayscale, 2));
    }
    if stats.unique_colors <= 2 {
      ladder.push((ColorMode::Grayscale, 1));
    }
  } else {
    ladder.push(if stats.has_alpha { (ColorMode::RGBA, 8) } else { (ColorMode::RGB, 8) });
    if stats.unique_colors <= options.max_palette_colors as usize {
      let max_depth = bit_depth_for_colors(stats.unique_colors);
      ladder.push((ColorMode::Palette, 8));
      if max_depth <= 4 {
        ladder.push((ColorMode::Palette, 4));
      }
      if max_depth <= 2 {
        ladder.push((ColorMode::Palette, 2));
      }
      if max_depth <= 1 {
        ladder.push((ColorMode::Palette, 1));
      }
    }
  }
  ladder
}

/// Palette mode below 8 bits cannot use per-row filter selection: sub-byte
/// palette rows are bit-packed, so a filter choice can't vary within a row.
fn is_feasible(color_mode: ColorMode, bit_depth: u8, filter_strategy: FilterStrategy) -> bool {
  !(color_mode == ColorMode::Palette && bit_depth < 8 && filter_strategy != FilterStrategy::SingleFilter)
}

/// Enumerates the full Cartesian product of `(color_mode, bit_depth) x
/// interlace x filter_strategy x deflate_level`, in deterministic order
/// (ladder order, then `InterlaceMethod::None` before `Adam7`, then
/// `IndexSet` insertion order for filters/deflate), dropping infeasible
/// combinations. Enumeration order is what tie-breaking in
/// [`crate::search::SearchDriver`] relies on.
pub fn enumerate(stats: &ImageStats, options: &Options) -> Vec<OptimizationCombo> {
  let ladder = color_mode_ladder(stats, options);
  let interlace_methods: &[InterlaceMethod] =
    if options.interlace { &[InterlaceMethod::None, InterlaceMethod::Adam7] } else { &[InterlaceMethod::None] };
  let filters: IndexSet<FilterStrategy> = options.effective_filters();
  let deflate_levels: IndexSet<DeflateLevel> = options.effective_deflate_levels();

  let mut out = Vec::new();
  for &(color_mode, bit_depth) in &ladder {
    for &interlace_method in interlace_methods {
      for &filter_strategy in &filters {
        if !is_feasible(color_mode, bit_depth, filter_strategy) {
          continue;
        }
        for &deflate_level in &deflate_levels {
          out.push(OptimizationCombo { color_mode, bit_depth, interlace_method, filter_strategy, deflate_level });
        }
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn grayscale_alpha_ladder_is_single_entry() {
    let stats = ImageStats { unique_colors: 3, has_alpha: true, is_grayscale: true };
    let ladder = color_mode_ladder(&stats, &Options::default());
    assert_eq!(ladder, vec![(ColorMode::GrayscaleAlpha, 8)]);
  }

  #[test]
  fn grayscale_ladder_adds_lower_depths_by_unique_count() {
    let stats = ImageStats { unique_colors: 2, has_alpha: false, is_grayscale: true };
    let ladder = color_mode_ladder(&stats, &Options::default());
    assert_eq!(
      ladder,
      vec![(ColorMode::Grayscale, 8), (ColorMode::Grayscale, 4), (ColorMode::Grayscale, 2), (ColorMode::Grayscale, 1)]
    );
  }

  #[test]
  fn color_ladder_adds_palette_when_under_threshold() {
    let stats = ImageStats { unique_colors: 10, has_alpha: false, is_grayscale: false };
    let ladder = color_mode_ladder(&stats, &Options::default());
    assert!(ladder.contains(&(ColorMode::RGB, 8)));
    assert!(ladder.contains(&(ColorMode::Palette, 8)));
    assert!(ladder.contains(&(ColorMode::Palette, 4)));
  }

  #[test]
  fn color_ladder_skips_palette_over_threshold() {
    let stats = ImageStats { unique_colors: 1000, has_alpha: false, is_grayscale: false };
    let ladder = color_mode_ladder(&stats, &Options::default());
    assert_eq!(ladder, vec![(ColorMode::RGB, 8)]);
  }

  #[test]
  fn auto_color_mode_disabled_uses_single_entry() {
    let stats = ImageStats { unique_colors: 1, has_alpha: true, is_grayscale: false };
    let mut options = Options::default();
    options.auto_color_mode = false;
    let ladder = color_mode_ladder(&stats, &options);
    assert_eq!(ladder, vec![(ColorMode::RGBA, 8)]);
  }

  #[test]
  fn enumerate_drops_infeasible_sub_byte_palette_non_single_filter() {
    let stats = ImageStats { unique_colors: 2, has_alpha: false, is_grayscale: false };
    let mut options = Options::default();
    options.max_palette_colors = 256;
    let combos = enumerate(&stats, &options);
    assert!(combos
      .iter()
      .all(|c| !(c.color_mode == ColorMode::Palette && c.bit_depth < 8 && c.filter_strategy != FilterStrategy::SingleFilter)));
  }

  #[test]
  fn enumerate_is_nonempty_for_typical_image() {
    let stats = ImageStats { unique_colors: 5, has_alpha: false, is_grayscale: false };
    let combos = enumerate(&stats, &Options::default());
    assert!(!combos.is_empty());
  }
}
