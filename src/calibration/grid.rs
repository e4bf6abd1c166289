//! Exhaustive or sampled evaluation of the Cartesian product of parameter grids.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::CalibrationError;

use super::cancel::CancellationToken;
use super::metrics::ComparisonMetrics;
use super::objective::Objective;
use super::parameter::ParameterRange;
use super::{CalibrationOptions, CalibrationResult, SearchOutcome, SearchStatus};

/// Product of the ranges' grid points, indexed without materializing any axis.
struct Grid<'a> {
    ranges: &'a [ParameterRange],
    lens: Vec<usize>,
    total: usize,
}

impl<'a> Grid<'a> {
    fn new(ranges: &'a [ParameterRange]) -> Result<Self, CalibrationError> {
        let lens = ranges
            .iter()
            .map(|r| {
                r.grid_len().ok_or_else(|| {
                    CalibrationError::GridTooLarge(format!("`{}` has too many grid points", r.parameter))
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;
        let total = lens
            .iter()
            .try_fold(1_usize, |acc, &len| acc.checked_mul(len))
            .ok_or_else(|| {
                let sizes: Vec<String> = lens.iter().map(usize::to_string).collect();
                CalibrationError::GridTooLarge(format!("{} combinations overflow", sizes.join(" x ")))
            })?;
        Ok(Self { ranges, lens, total })
    }

    /// Values of the combination at `index`; the last axis varies fastest.
    fn combination(&self, mut index: usize) -> Vec<f64> {
        let mut values = vec![0.0; self.ranges.len()];
        for ((slot, range), &len) in values.iter_mut().zip(self.ranges).zip(&self.lens).rev() {
            *slot = range.grid_value(index % len);
            index /= len;
        }
        values
    }
}

/// Evaluates every grid combination, or a seeded uniform sample of
/// `options.max_combinations` of them when the grid is larger.
///
/// Results are sorted ascending by RMSE. A failed trial stays in the ranking
/// with penalty metrics.
pub(crate) fn grid_search(
    objective: &Objective<'_>,
    ranges: &[ParameterRange],
    options: &CalibrationOptions,
    cancel: Option<&CancellationToken>,
) -> Result<SearchOutcome, CalibrationError> {
    let grid = Grid::new(ranges)?;
    let cap = options.max_combinations.max(1);

    let (indices, mut status) = if grid.total > cap {
        warn!(
            total = grid.total,
            sampled = cap,
            "grid exceeds combination cap, evaluating a random sample"
        );
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut picked = index::sample(&mut rng, grid.total, cap).into_vec();
        picked.sort_unstable();
        (
            picked,
            SearchStatus::Sampled {
                total_combinations: grid.total,
            },
        )
    } else {
        ((0..grid.total).collect(), SearchStatus::Exhaustive)
    };
    debug!(combinations = indices.len(), "evaluating grid");

    let is_cancelled = || cancel.is_some_and(CancellationToken::is_cancelled);
    let evaluated: Vec<Option<CalibrationResult>> = indices
        .par_iter()
        .map(|&i| {
            if is_cancelled() {
                return None;
            }
            let values = grid.combination(i);
            let parameters = objective.assignment(&values);
            Some(match objective.evaluate(&values) {
                Ok(eval) => CalibrationResult {
                    parameters,
                    metrics: eval.metrics,
                    simulation_results: Some(eval.results),
                },
                Err(e) => {
                    warn!(combination = i, error = %e, "grid trial failed");
                    CalibrationResult {
                        parameters,
                        metrics: ComparisonMetrics::penalty(),
                        simulation_results: None,
                    }
                }
            })
        })
        .collect();

    let mut results: Vec<CalibrationResult> = evaluated.into_iter().flatten().collect();
    if results.len() < indices.len() {
        status = SearchStatus::Cancelled;
    }
    results.sort_by(|a, b| a.metrics.rmse.total_cmp(&b.metrics.rmse));

    Ok(SearchOutcome {
        status,
        evaluations: results.len(),
        results,
    })
}
