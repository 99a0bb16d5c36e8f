//! In-process configuration surface mirroring what a CLI driver's flags would
//! set field-for-field. `Options` carries no argument-parsing logic of its
//! own -- that is the external driver's job.

use indexmap::IndexSet;

use crate::strategy::{FilterStrategy, PartitioningParams};
use crate::zlib::DeflateLevel;

/// The canonical default filter-strategy table, consulted by both
/// `Options::default()` and the empty-list fallback path -- never a
/// hardcoded ad hoc list scattered across call sites.
pub fn default_filter_strategies() -> IndexSet<FilterStrategy> {
  FilterStrategy::ALL.into_iter().collect()
}

/// The canonical default deflate-level table.
pub fn default_deflate_levels() -> IndexSet<DeflateLevel> {
  DeflateLevel::ALL.into_iter().collect()
}

/// In-process configuration consumed by [`crate::optimize`]/[`crate::optimize_from_memory`].
#[derive(Debug, Clone)]
pub struct Options {
  /// Enables the auto color-mode ladder. When `false`, the search uses
  /// exactly one of `(RGB,8)`/`(RGBA,8)` per alpha presence.
  pub auto_color_mode: bool,
  /// Adds `Adam7` to the interlace axis (default off; interlacing is never
  /// mandatory).
  pub interlace: bool,
  /// Allows `FilterStrategy::PartitionOptimized` in the searched set.
  pub partition: bool,
  /// Subset of filter strategies to search; empty means "use the default
  /// table".
  pub filters: IndexSet<FilterStrategy>,
  /// Subset of deflate levels to search; empty means "use the default
  /// table".
  pub deflate_levels: IndexSet<DeflateLevel>,
  /// Concurrency cap for the worker pool; `0` means "use the logical core
  /// count".
  pub jobs: usize,
  /// Ceiling on palette size considered by the auto color-mode ladder.
  pub max_palette_colors: u16,
  /// Enables per-candidate reporting.
  pub verbose: bool,
  /// Partitioning thresholds consumed by `FilterStrategy::PartitionOptimized`.
  pub partitioning_params: PartitioningParams,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      auto_color_mode: true,
      interlace: false,
      partition: true,
      filters: IndexSet::new(),
      deflate_levels: IndexSet::new(),
      jobs: 0,
      max_palette_colors: 256,
      verbose: false,
      partitioning_params: PartitioningParams::default(),
    }
  }
}

impl Options {
  /// Resolves the effective filter-strategy set: the configured subset if
  /// non-empty, the canonical default table otherwise, with
  /// `PartitionOptimized` dropped when `partition` is disabled.
  pub fn effective_filters(&self) -> IndexSet<FilterStrategy> {
    let mut set = if self.filters.is_empty() { default_filter_strategies() } else { self.filters.clone() };
    if !self.partition {
      set.shift_remove(&FilterStrategy::PartitionOptimized);
    }
    set
  }

  /// Resolves the effective deflate-level set.
  pub fn effective_deflate_levels(&self) -> IndexSet<DeflateLevel> {
    if self.deflate_levels.is_empty() {
      default_deflate_levels()
    } else {
      self.deflate_levels.clone()
    }
  }

  /// Resolves `jobs` to an actual thread count: `0` means "logical core
  /// count".
  pub fn effective_jobs(&self) -> usize {
    if self.jobs == 0 {
      std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
      self.jobs
    }
  }
}
