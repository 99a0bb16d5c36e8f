//! Enumerates combinations, runs candidates concurrently under a bounded
//! worker pool, and selects the smallest result, breaking ties by
//! first-enumerated order.
//!
//! Builds a scoped `rayon::ThreadPoolBuilder::new().num_threads(threads)`
//! pool per run rather than relying on the global pool, so concurrent calls
//! into this crate don't fight over one shared pool's thread count.

use log::debug;
use rayon::ThreadPoolBuilder;

use crate::candidate;
use crate::chunk::Chunk;
use crate::combo::{self, OptimizationCombo};
use crate::error::{PngError, PngResult};
use crate::image_buffer::ImageBuffer;
use crate::options::Options;
use crate::report;
use crate::selector::FilterCostModel;

pub use crate::candidate::OptimizationResult;

/// Runs the full combination search over `image`, returning the winning
/// `OptimizationResult`. `preserved_chunks` are carried into every
/// candidate's output verbatim (empty for a fresh encode).
pub fn run(image: &ImageBuffer, options: &Options, preserved_chunks: &[Chunk]) -> PngResult<OptimizationResult> {
  let stats = image.analyze();
  let combos = combo::enumerate(&stats, options);
  debug!("enumerated {} combinations for {}x{} image", combos.len(), image.width, image.height);

  let pool = ThreadPoolBuilder::new()
    .num_threads(options.effective_jobs())
    .build()
    .map_err(|_| PngError::CandidateInternalError("failed to build worker pool"))?;

  let params = options.partitioning_params;
  let results: Vec<Option<OptimizationResult>> = pool.install(|| {
    use rayon::prelude::*;
    combos
      .par_iter()
      .map(|&combo| run_one(image, combo, preserved_chunks, &params))
      .collect()
  });

  let combos_considered = combos.len();
  let mut winner = select_winner(combos, results, options.verbose)?;
  winner.candidates_considered = combos_considered;
  Ok(winner)
}

/// Runs exactly one combination, outside the parallel pool. Used by
/// [`crate::recompress`], whose restricted filter x deflate-level search is
/// small enough to run sequentially without spinning up a `rayon` pool.
pub fn run_single_combo(
  image: &ImageBuffer, combo: OptimizationCombo, preserved_chunks: &[Chunk], cost_model: FilterCostModel,
  params: &crate::strategy::PartitioningParams,
) -> PngResult<OptimizationResult> {
  candidate::run(image, combo, preserved_chunks, cost_model, params)
}

fn run_one(
  image: &ImageBuffer, combo: OptimizationCombo, preserved_chunks: &[Chunk],
  params: &crate::strategy::PartitioningParams,
) -> Option<OptimizationResult> {
  match candidate::run(image, combo, preserved_chunks, FilterCostModel::FilteredDelta, params) {
    Ok(result) => {
      report::trace_candidate(&result);
      Some(result)
    }
    Err(err) => {
      log::warn!("candidate {combo:?} dropped from the search: {err}");
      None
    }
  }
}

/// `argmin(compressed_size)`, first-enumerated order breaks ties -- the
/// reduction only ever looks at `combos`/`results` pairwise in enumeration
/// order, never at completion order.
fn select_winner(
  combos: Vec<OptimizationCombo>, results: Vec<Option<OptimizationResult>>, verbose: bool,
) -> PngResult<OptimizationResult> {
  let mut best: Option<OptimizationResult> = None;
  for (combo, result) in combos.into_iter().zip(results.into_iter()) {
    let Some(result) = result else { continue };
    if verbose {
      debug!("candidate {combo:?}: {} bytes, {} filter transitions", result.compressed_size, result.filter_transitions);
    }
    match &best {
      None => best = Some(result),
      Some(current_best) if result.compressed_size < current_best.compressed_size => best = Some(result),
      _ => {}
    }
  }
  best.ok_or(PngError::AllCandidatesFailed)
}
