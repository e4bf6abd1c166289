//! Differential evolution over the box spanned by the parameter ranges.
//!
//! Strategy `best1bin` with Latin-hypercube initialisation and deferred
//! updating: each generation's trial vectors are drawn on the calling thread,
//! scored in parallel, then selected in population order. Every random draw
//! comes from one seeded [`StdRng`], so a run is reproducible regardless of
//! how many worker threads score the trials.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::error::CalibrationError;

use super::cancel::CancellationToken;
use super::metrics::{ComparisonMetrics, FAILED_TRIAL_PENALTY};
use super::objective::Objective;
use super::parameter::ParameterRange;
use super::{CalibrationOptions, CalibrationResult, SearchOutcome, SearchStatus};

/// Smallest population regardless of dimension.
const MIN_POPULATION: usize = 5;

/// Population members live in the unit hypercube and are scaled to the
/// parameter bounds only when scored.
struct Bounds {
    lower: Vec<f64>,
    span: Vec<f64>,
}

impl Bounds {
    fn new(ranges: &[ParameterRange]) -> Self {
        Self {
            lower: ranges.iter().map(|r| r.min_value).collect(),
            span: ranges.iter().map(|r| r.max_value - r.min_value).collect(),
        }
    }

    fn scale(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(self.lower.iter().zip(&self.span))
            .map(|(u, (lo, span))| lo + u * span)
            .collect()
    }
}

/// Score of one trial: its RMSE, or [`FAILED_TRIAL_PENALTY`] if it failed.
struct Trial {
    values: Vec<f64>,
    metrics: Option<ComparisonMetrics>,
}

impl Trial {
    fn energy(&self) -> f64 {
        self.metrics.map_or(FAILED_TRIAL_PENALTY, |m| m.rmse)
    }
}

struct History {
    entries: VecDeque<CalibrationResult>,
    limit: usize,
}

impl History {
    fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Records a successful trial, keeping only the most recent entries.
    fn record(&mut self, objective: &Objective<'_>, trial: &Trial) {
        let Some(metrics) = trial.metrics else { return };
        if self.limit == 0 {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(CalibrationResult {
            parameters: objective.assignment(&trial.values),
            metrics,
            simulation_results: None,
        });
    }
}

fn score_all(objective: &Objective<'_>, bounds: &Bounds, members: &[Vec<f64>]) -> Vec<Trial> {
    members
        .par_iter()
        .map(|unit| {
            let values = bounds.scale(unit);
            let metrics = objective.evaluate(&values).ok().map(|e| e.metrics);
            Trial { values, metrics }
        })
        .collect()
}

/// Stratified sample of `count` points in `[0, 1)^dims`.
fn latin_hypercube(rng: &mut StdRng, count: usize, dims: usize) -> Vec<Vec<f64>> {
    let segment = 1.0 / count as f64;
    let mut population = vec![vec![0.0; dims]; count];
    let mut order: Vec<usize> = (0..count).collect();
    for d in 0..dims {
        order.shuffle(rng);
        for (member, &stratum) in population.iter_mut().zip(&order) {
            member[d] = (stratum as f64 + rng.random::<f64>()) * segment;
        }
    }
    population
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Minimises RMSE with differential evolution.
///
/// Returns the best assignment, re-scored with its monthly results, followed
/// by the most recent successful trials (oldest first).
pub(crate) fn differential_evolution(
    objective: &Objective<'_>,
    ranges: &[ParameterRange],
    options: &CalibrationOptions,
    cancel: Option<&CancellationToken>,
) -> Result<SearchOutcome, CalibrationError> {
    let dims = ranges.len();
    let bounds = Bounds::new(ranges);
    let size = (options.population_size * dims).max(MIN_POPULATION);
    let (mut_lo, mut_hi) = options.mutation;
    let crossover = options.recombination;
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut history = History::new(options.history_limit);

    let mut population = latin_hypercube(&mut rng, size, dims);
    let initial = score_all(objective, &bounds, &population);
    let mut evaluations = initial.len();
    let mut energies: Vec<f64> = initial.iter().map(Trial::energy).collect();
    let mut best = 0;
    for (i, trial) in initial.iter().enumerate() {
        history.record(objective, trial);
        if energies[i] < energies[best] {
            best = i;
        }
    }

    let mut status = SearchStatus::MaxIterations;
    for generation in 0..options.max_iterations {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            status = SearchStatus::Cancelled;
            break;
        }

        let scale = mut_lo + rng.random::<f64>() * (mut_hi - mut_lo);
        let trials: Vec<Vec<f64>> = (0..size)
            .map(|i| {
                let mut donors = index::sample(&mut rng, size, 3)
                    .into_iter()
                    .filter(|&j| j != i);
                let (r0, r1) = match (donors.next(), donors.next()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => (best, best),
                };
                let fill = rng.random_range(0..dims);
                (0..dims)
                    .map(|d| {
                        if d == fill || rng.random::<f64>() < crossover {
                            let v = population[best][d] + scale * (population[r0][d] - population[r1][d]);
                            if (0.0..=1.0).contains(&v) { v } else { rng.random::<f64>() }
                        } else {
                            population[i][d]
                        }
                    })
                    .collect()
            })
            .collect();

        let scored = score_all(objective, &bounds, &trials);
        evaluations += scored.len();
        for (i, (unit, trial)) in trials.into_iter().zip(&scored).enumerate() {
            history.record(objective, trial);
            let energy = trial.energy();
            if energy < energies[i] {
                population[i] = unit;
                energies[i] = energy;
                if energy < energies[best] {
                    best = i;
                }
            }
        }

        let (mean, std) = mean_and_std(&energies);
        debug!(generation, best_rmse = energies[best], mean_rmse = mean, "generation complete");
        if std <= options.abs_tolerance + options.tolerance * mean.abs() {
            status = SearchStatus::Converged;
            break;
        }
    }

    let best_values = bounds.scale(&population[best]);
    let best_result = match objective.evaluate(&best_values) {
        Ok(eval) => CalibrationResult {
            parameters: objective.assignment(&best_values),
            metrics: eval.metrics,
            simulation_results: Some(eval.results),
        },
        Err(_) => CalibrationResult {
            parameters: objective.assignment(&best_values),
            metrics: ComparisonMetrics::penalty(),
            simulation_results: None,
        },
    };

    let mut results = Vec::with_capacity(history.entries.len() + 1);
    results.push(best_result);
    results.extend(history.entries);
    Ok(SearchOutcome {
        status,
        evaluations,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{ComparisonTarget, ParameterField};
    use crate::config::BuildingConfig;
    use approx::assert_abs_diff_eq;

    #[test]
    fn latin_hypercube_covers_every_stratum() {
        let mut rng = StdRng::seed_from_u64(1);
        let pop = latin_hypercube(&mut rng, 8, 3);
        assert_eq!(pop.len(), 8);
        for d in 0..3 {
            let mut strata: Vec<usize> = pop.iter().map(|m| (m[d] * 8.0).floor() as usize).collect();
            strata.sort_unstable();
            assert_eq!(strata, (0..8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn bounds_scale_unit_points() {
        let ranges = [
            ParameterRange::with_steps(ParameterField::WallUValue, 0.1, 0.9, 2),
            ParameterRange::with_steps(ParameterField::LocalAcCop, 2.0, 2.0, 2),
        ];
        let b = Bounds::new(&ranges);
        assert_eq!(b.scale(&[0.0, 0.5]), vec![0.1, 2.0]);
        assert_abs_diff_eq!(b.scale(&[1.0, 1.0])[0], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn history_keeps_the_tail() {
        let fields = [ParameterField::WallUValue];
        let cfg = BuildingConfig::modern_office();
        let objective = Objective {
            floor_spec: &cfg.floor_spec,
            equipment_spec: &cfg.equipment_spec,
            monthly_conditions: &cfg.monthly_conditions,
            actual_data: &[],
            target: ComparisonTarget::Total,
            parameters: &fields,
        };
        let mut history = History::new(3);
        for v in 0..5 {
            let trial = Trial {
                values: vec![v as f64],
                metrics: Some(ComparisonMetrics {
                    rmse: v as f64,
                    ..ComparisonMetrics::penalty()
                }),
            };
            history.record(&objective, &trial);
        }
        history.record(&objective, &Trial { values: vec![9.0], metrics: None });
        let kept: Vec<f64> = history.entries.iter().map(|r| r.parameters[0].value).collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
    }
}
