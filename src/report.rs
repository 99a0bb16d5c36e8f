//! Reporting/trace: per-candidate and winner statistics, surfaced only
//! through the `log` facade rather than printed directly. Human-readable
//! rendering is the external driver's job; this module only assembles the
//! structured summary that driver would print.

use log::{debug, trace};

use crate::candidate::OptimizationResult;

/// A flattened summary of one candidate's outcome, suitable for a verbose
/// report line. Carries no formatting opinion of its own.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSummary {
  pub compressed_size: usize,
  pub filter_transitions: usize,
  pub processing_time: std::time::Duration,
}

impl From<&OptimizationResult> for CandidateSummary {
  fn from(result: &OptimizationResult) -> Self {
    Self {
      compressed_size: result.compressed_size,
      filter_transitions: result.filter_transitions,
      processing_time: result.processing_time,
    }
  }
}

/// Logs one candidate's outcome at `debug` level (combo + size) and its
/// per-row filter choices at `trace` level, matching the density the
/// SearchDriver's own `debug!` call already uses for the enumeration count.
pub fn trace_candidate(result: &OptimizationResult) {
  debug!(
    "candidate {:?}: {} bytes, {} filter transitions, {:?} elapsed",
    result.combo, result.compressed_size, result.filter_transitions, result.processing_time
  );
  trace!("candidate {:?} filters: {:?}", result.combo, result.filters);
}

/// Logs the final winning combination, at `debug` level.
pub fn trace_winner(result: &OptimizationResult, candidates_considered: usize) {
  debug!(
    "winner: {:?}, {} bytes out of {} candidates considered",
    result.combo, result.compressed_size, candidates_considered
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::combo::OptimizationCombo;
  use crate::filter::FilterType;
  use crate::ihdr::{ColorMode, InterlaceMethod};
  use crate::strategy::FilterStrategy;
  use crate::zlib::DeflateLevel;

  fn sample_result() -> OptimizationResult {
    OptimizationResult {
      combo: OptimizationCombo {
        color_mode: ColorMode::RGB,
        bit_depth: 8,
        interlace_method: InterlaceMethod::None,
        filter_strategy: FilterStrategy::SingleFilter,
        deflate_level: DeflateLevel::Default,
      },
      compressed_size: 123,
      filters: vec![FilterType::None],
      filter_transitions: 0,
      file_bytes: vec![0; 123],
      processing_time: std::time::Duration::from_millis(1),
      candidates_considered: 4,
    }
  }

  #[test]
  fn summary_mirrors_result_fields() {
    let result = sample_result();
    let summary = CandidateSummary::from(&result);
    assert_eq!(summary.compressed_size, 123);
    assert_eq!(summary.filter_transitions, 0);
  }

  #[test]
  fn trace_calls_do_not_panic_without_a_logger_installed() {
    let result = sample_result();
    trace_candidate(&result);
    trace_winner(&result, 4);
  }
}
