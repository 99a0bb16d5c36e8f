//! Filter strategy layer: a whole-image single-filter optimizer, a
//! hysteresis-based partition optimizer, plus the scanline-adaptive and
//! weighted-continuity strategies, all built on top of [`crate::selector`].

use crate::filter::{apply, FilterType};
use crate::ihdr::ColorMode;
use crate::selector::{
  cost_of_filtered, policy_forced_filter, row_costs, FilterCostModel, WeightedContinuitySelector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterStrategy {
  SingleFilter,
  ScanlineAdaptive,
  WeightedContinuity,
  PartitionOptimized,
}

impl FilterStrategy {
  pub const ALL: [FilterStrategy; 4] = [
    FilterStrategy::SingleFilter,
    FilterStrategy::ScanlineAdaptive,
    FilterStrategy::WeightedContinuity,
    FilterStrategy::PartitionOptimized,
  ];
}

/// Thresholds governing how reluctant the partition optimizer is to switch
/// its current filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitioningParams {
  pub min_rows_minor: usize,
  pub min_rows_strong: usize,
  pub minor_threshold: f64,
  pub strong_threshold: f64,
}

impl Default for PartitioningParams {
  fn default() -> Self {
    Self { min_rows_minor: 5, min_rows_strong: 2, minor_threshold: 1.10, strong_threshold: 1.30 }
  }
}

/// Chooses the filter for every row of a raw (unfiltered) raster, where
/// `rows` are raw scanlines of equal `stride` length (one Adam7 pass, or the
/// whole non-interlaced image).
pub fn choose_filters(
  strategy: FilterStrategy, rows: &[&[u8]], bpp: usize, color_mode: ColorMode, bit_depth: u8,
  cost_model: FilterCostModel, params: &PartitioningParams,
) -> Vec<FilterType> {
  if rows.is_empty() {
    return Vec::new();
  }
  if let Some(forced) = policy_forced_filter(color_mode, bit_depth) {
    return vec![forced; rows.len()];
  }
  match strategy {
    FilterStrategy::SingleFilter => single_filter(rows, bpp, cost_model),
    FilterStrategy::ScanlineAdaptive => scanline_adaptive(rows, bpp, cost_model),
    FilterStrategy::WeightedContinuity => {
      weighted_continuity(rows, bpp, color_mode, bit_depth, cost_model)
    }
    FilterStrategy::PartitionOptimized => partition_optimized(rows, bpp, cost_model, params),
  }
}

/// Sums the per-row cost across the whole image for each filter and picks
/// the minimum-sum filter for every row.
fn single_filter(rows: &[&[u8]], bpp: usize, cost_model: FilterCostModel) -> Vec<FilterType> {
  let stride = rows[0].len();
  let mut scratch = vec![0u8; stride];
  let mut totals = [0u64; 5];
  let mut previous: &[u8] = &[];
  for &row in rows {
    for (idx, &f) in FilterType::ALL.iter().enumerate() {
      apply(f, row, previous, bpp, &mut scratch);
      totals[idx] += cost_of_filtered(&scratch, cost_model);
    }
    previous = row;
  }
  let mut best_idx = 0;
  for i in 1..5 {
    if totals[i] < totals[best_idx] {
      best_idx = i;
    }
  }
  vec![FilterType::ALL[best_idx]; rows.len()]
}

/// Applied independently to every row: minimum per-row cost, no cross-row
/// state.
fn scanline_adaptive(rows: &[&[u8]], bpp: usize, cost_model: FilterCostModel) -> Vec<FilterType> {
  let stride = rows[0].len();
  let mut scratch = vec![0u8; stride];
  let mut previous: &[u8] = &[];
  let mut out = Vec::with_capacity(rows.len());
  for &row in rows {
    let costs = row_costs(row, previous, bpp, cost_model, &mut scratch);
    let mut best_idx = 0;
    for i in 1..5 {
      if costs[i] < costs[best_idx] {
        best_idx = i;
      }
    }
    out.push(FilterType::ALL[best_idx]);
    previous = row;
  }
  out
}

fn weighted_continuity(
  rows: &[&[u8]], bpp: usize, color_mode: ColorMode, bit_depth: u8, cost_model: FilterCostModel,
) -> Vec<FilterType> {
  let stride = rows[0].len();
  let mut scratch = vec![0u8; stride];
  let mut selector = WeightedContinuitySelector::default();
  let mut previous: &[u8] = &[];
  let mut out = Vec::with_capacity(rows.len());
  for &row in rows {
    out.push(selector.select(row, previous, bpp, color_mode, bit_depth, cost_model, &mut scratch));
    previous = row;
  }
  out
}

/// Walks rows top-to-bottom, staying on `current` unless a better filter
/// sustains its advantage across a look-ahead window.
fn partition_optimized(
  rows: &[&[u8]], bpp: usize, cost_model: FilterCostModel, params: &PartitioningParams,
) -> Vec<FilterType> {
  let height = rows.len();
  let stride = rows[0].len();
  let mut scratch = vec![0u8; stride];

  // Precompute per-row, per-filter costs once; the look-ahead window reuses
  // them instead of recomputing.
  let mut all_costs: Vec<[u64; 5]> = Vec::with_capacity(height);
  let mut previous: &[u8] = &[];
  for &row in rows {
    all_costs.push(row_costs(row, previous, bpp, cost_model, &mut scratch));
    previous = row;
  }

  let mut out = Vec::with_capacity(height);
  let mut current = FilterType::None;
  let current_idx = |f: FilterType| FilterType::ALL.iter().position(|&x| x == f).unwrap();

  for y in 0..height {
    if y > height.saturating_sub(params.min_rows_minor) {
      out.push(current);
      continue;
    }

    let costs = &all_costs[y];
    let mut best_idx = 0;
    for i in 1..5 {
      if costs[i] < costs[best_idx] {
        best_idx = i;
      }
    }
    let best = FilterType::ALL[best_idx];

    if best == current {
      out.push(current);
      continue;
    }

    let cur_idx = current_idx(current);
    let mut strong_hits = 0usize;
    let mut minor_hits = 0usize;
    for k in 0..params.min_rows_minor {
      let yk = y + k;
      if yk >= height {
        break;
      }
      let c_current = all_costs[yk][cur_idx] as f64;
      let c_best = all_costs[yk][best_idx] as f64;
      if c_best <= 0.0 {
        // c_current / c_best is unboundedly large whenever the best filter is
        // free and the current one isn't: count it as both kinds of hit.
        if c_current > 0.0 {
          strong_hits += 1;
          minor_hits += 1;
        }
        continue;
      }
      let ratio = c_current / c_best;
      if ratio >= params.strong_threshold {
        strong_hits += 1;
      }
      if ratio >= params.minor_threshold {
        minor_hits += 1;
      }
    }

    if strong_hits >= params.min_rows_strong || minor_hits >= params.min_rows_minor {
      current = best;
    }
    out.push(current);
  }
  out
}

/// Number of indices `i` where `filters[i] != filters[i-1]`.
pub fn count_filter_transitions(filters: &[FilterType]) -> usize {
  filters.windows(2).filter(|w| w[0] != w[1]).count()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_filter_returns_one_filter_for_whole_image() {
    let r0 = [0u8, 10, 20, 30];
    let r1 = [1u8, 11, 21, 31];
    let rows: Vec<&[u8]> = vec![&r0, &r1];
    let filters = choose_filters(
      FilterStrategy::SingleFilter,
      &rows,
      1,
      ColorMode::Grayscale,
      8,
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    );
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0], filters[1]);
  }

  #[test]
  fn partition_optimizer_avoids_thrashing_on_noise() {
    // Rows alternate between two very similar patterns; the optimizer should
    // not flip every row for marginal gains.
    let pattern_a = [5u8, 5, 5, 5, 5, 5, 5, 5];
    let pattern_b = [5u8, 5, 5, 5, 5, 5, 5, 6];
    let mut owned_rows = Vec::new();
    for i in 0..20 {
      owned_rows.push(if i % 2 == 0 { pattern_a } else { pattern_b });
    }
    let rows: Vec<&[u8]> = owned_rows.iter().map(|r| r.as_slice()).collect();
    let filters = choose_filters(
      FilterStrategy::PartitionOptimized,
      &rows,
      1,
      ColorMode::RGB,
      8,
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    );
    assert_eq!(filters.len(), 20);
    // With default thresholds, noise this small should not cause a
    // transition on every single row.
    assert!(count_filter_transitions(&filters) < 19);
  }

  #[test]
  fn partition_optimizer_emits_current_near_tail() {
    let rows_owned: Vec<[u8; 4]> = (0..10).map(|i| [i as u8, 0, 0, 0]).collect();
    let rows: Vec<&[u8]> = rows_owned.iter().map(|r| r.as_slice()).collect();
    let filters = choose_filters(
      FilterStrategy::PartitionOptimized,
      &rows,
      1,
      ColorMode::RGB,
      8,
      FilterCostModel::FilteredDelta,
      &PartitioningParams::default(),
    );
    // Last min_rows_minor-1 rows must equal the filter chosen just before the
    // tail lock-in, i.e. no further changes near the tail.
    let params = PartitioningParams::default();
    let tail_start = filters.len() - (params.min_rows_minor - 1);
    let locked = filters[tail_start];
    assert!(filters[tail_start..].iter().all(|&f| f == locked));
  }

  #[test]
  fn palette_forces_none_through_every_strategy() {
    let r0 = [0u8, 1, 2, 3];
    let rows: Vec<&[u8]> = vec![&r0];
    for &strategy in FilterStrategy::ALL.iter() {
      let filters = choose_filters(
        strategy,
        &rows,
        1,
        ColorMode::Palette,
        4,
        FilterCostModel::FilteredDelta,
        &PartitioningParams::default(),
      );
      assert_eq!(filters, vec![FilterType::None]);
    }
  }
}
