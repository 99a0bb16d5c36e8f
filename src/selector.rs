//! Per-row filter choice by minimum cost, with the palette/sub-8-bit-grayscale
//! policy override and an optional weighted-continuity bias.

use crate::filter::{apply, FilterType};
use crate::ihdr::ColorMode;

/// Which sum to use when scoring a filtered scanline. `FilteredDelta` is the
/// default cost model; `Classic` is kept as a test-only toggle for
/// comparison against the older heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCostModel {
  /// `S = Σ |F[i+1] - F[i]|` over the filtered bytes: tracks local volatility
  /// of the filtered signal.
  FilteredDelta,
  /// `S = Σ |F[i]|` treating each filtered byte as signed — the classic PNG
  /// heuristic used by some other encoders.
  Classic,
}

impl Default for FilterCostModel {
  fn default() -> Self {
    FilterCostModel::FilteredDelta
  }
}

/// `S = Σ |F[i+1] − F[i]|` (or the classic `Σ|F[i]|`, signed-byte interpreted)
/// over an already-filtered scanline.
pub fn cost_of_filtered(filtered: &[u8], model: FilterCostModel) -> u64 {
  match model {
    FilterCostModel::FilteredDelta => {
      let mut sum: u64 = 0;
      for w in filtered.windows(2) {
        sum += (w[1] as i32 - w[0] as i32).unsigned_abs() as u64;
      }
      sum
    }
    FilterCostModel::Classic => {
      filtered.iter().map(|&b| (b as i8).unsigned_abs() as u64).sum()
    }
  }
}

/// If the image/row is forced to a single filter by policy: palette color
/// mode, or grayscale with bit_depth < 8.
pub fn policy_forced_filter(color_mode: ColorMode, bit_depth: u8) -> Option<FilterType> {
  if color_mode == ColorMode::Palette {
    return Some(FilterType::None);
  }
  if color_mode == ColorMode::Grayscale && bit_depth < 8 {
    return Some(FilterType::None);
  }
  None
}

/// Computes, for one scanline, the cost of each of the five filters.
/// `scratch` is a caller-provided `[stride; 5]`-shaped buffer reused across
/// rows to avoid per-row allocation.
pub fn row_costs(
  current: &[u8], previous: &[u8], bpp: usize, model: FilterCostModel, scratch: &mut [u8],
) -> [u64; 5] {
  let mut costs = [0u64; 5];
  for (idx, &f) in FilterType::ALL.iter().enumerate() {
    apply(f, current, previous, bpp, scratch);
    costs[idx] = cost_of_filtered(scratch, model);
  }
  costs
}

/// Picks the minimum-cost filter for one row, honoring the policy override.
pub fn select_row_filter(
  current: &[u8], previous: &[u8], bpp: usize, color_mode: ColorMode, bit_depth: u8,
  model: FilterCostModel, scratch: &mut [u8],
) -> FilterType {
  if let Some(forced) = policy_forced_filter(color_mode, bit_depth) {
    return forced;
  }
  let costs = row_costs(current, previous, bpp, model, scratch);
  argmin_filter(&costs)
}

fn argmin_filter(costs: &[u64; 5]) -> FilterType {
  let mut best_idx = 0;
  for i in 1..5 {
    if costs[i] < costs[best_idx] {
      best_idx = i;
    }
  }
  FilterType::ALL[best_idx]
}

/// Maintains `last_used` across rows and biases its cost down by `w = 0.9`
/// before taking the argmin, favoring runs of the same filter.
#[derive(Debug, Clone, Copy)]
pub struct WeightedContinuitySelector {
  last_used: FilterType,
  weight: f64,
}

impl Default for WeightedContinuitySelector {
  fn default() -> Self {
    Self { last_used: FilterType::None, weight: 0.9 }
  }
}

impl WeightedContinuitySelector {
  pub fn select(
    &mut self, current: &[u8], previous: &[u8], bpp: usize, color_mode: ColorMode, bit_depth: u8,
    model: FilterCostModel, scratch: &mut [u8],
  ) -> FilterType {
    if let Some(forced) = policy_forced_filter(color_mode, bit_depth) {
      self.last_used = forced;
      return forced;
    }
    let costs = row_costs(current, previous, bpp, model, scratch);
    let last_idx = FilterType::ALL.iter().position(|&f| f == self.last_used).unwrap();
    let mut weighted = [0f64; 5];
    for i in 0..5 {
      weighted[i] = costs[i] as f64;
    }
    weighted[last_idx] *= self.weight;

    let mut best_idx = 0;
    for i in 1..5 {
      if weighted[i] < weighted[best_idx] {
        best_idx = i;
      }
    }
    self.last_used = FilterType::ALL[best_idx];
    self.last_used
  }
}
