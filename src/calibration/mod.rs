//! Parameter calibration against metered energy data.
//!
//! Two search strategies share one [`Objective`]: [`CalibrationMethod::Grid`]
//! evaluates a (possibly sampled) Cartesian grid, and
//! [`CalibrationMethod::Optimize`] runs differential evolution over the
//! continuous box. Both score trials in parallel on a rayon pool.

pub mod cancel;
mod evolution;
mod grid;
pub mod metrics;
pub mod objective;
pub mod parameter;
pub mod target;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::BuildingConfig;
use crate::error::CalibrationError;
use crate::model::engine::BuildingEnergyModel;
use crate::model::types::{EquipmentSpec, FloorSpec, MonthlyCondition, MonthlyResult};

pub use cancel::{CancelOnDrop, CancellationToken};
pub use metrics::{ComparisonMetrics, FAILED_TRIAL_PENALTY, compute_metrics};
pub use objective::Objective;
pub use parameter::{ParameterField, ParameterRange, ParameterValue, apply_parameters};
pub use target::{ActualDataPoint, ComparisonTarget, extract_comparison_values};

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    Grid,
    Optimize,
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::Optimize => write!(f, "optimize"),
        }
    }
}

impl FromStr for CalibrationMethod {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "optimize" => Ok(Self::Optimize),
            other => Err(CalibrationError::UnknownMethod(other.to_string())),
        }
    }
}

/// Search limits and tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOptions {
    /// Seed for grid sampling and the optimizer.
    pub seed: u64,
    /// Grid size above which a random sample of this many combinations is evaluated.
    pub max_combinations: usize,
    /// Optimizer generation limit.
    pub max_iterations: usize,
    /// Optimizer population per searched parameter.
    pub population_size: usize,
    /// Dither range for the optimizer mutation factor.
    pub mutation: (f64, f64),
    /// Optimizer crossover probability.
    pub recombination: f64,
    /// Relative convergence tolerance.
    pub tolerance: f64,
    /// Absolute convergence tolerance.
    pub abs_tolerance: f64,
    /// Optimizer trials kept after the best result.
    pub history_limit: usize,
    /// Dedicated worker threads; `None` uses the global pool.
    pub workers: Option<usize>,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            max_combinations: 1000,
            max_iterations: 100,
            population_size: 15,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            tolerance: 1e-6,
            abs_tolerance: 1e-6,
            history_limit: 10,
            workers: None,
        }
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchStatus {
    /// Every grid combination was evaluated.
    Exhaustive,
    /// The grid exceeded the cap; results are a random sample and the best
    /// one need not be the grid optimum.
    Sampled { total_combinations: usize },
    /// The optimizer population converged.
    Converged,
    /// The optimizer ran out of generations.
    MaxIterations,
    /// Stopped through a [`CancellationToken`]; results are partial.
    Cancelled,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhaustive => write!(f, "exhaustive"),
            Self::Sampled { total_combinations } => {
                write!(f, "sampled from {total_combinations} combinations")
            }
            Self::Converged => write!(f, "converged"),
            Self::MaxIterations => write!(f, "iteration limit reached"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One scored parameter assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationResult {
    pub parameters: Vec<ParameterValue>,
    pub metrics: ComparisonMetrics,
    /// Monthly results of the assignment; absent for optimizer history entries
    /// and failed trials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_results: Option<Vec<MonthlyResult>>,
}

impl CalibrationResult {
    /// Value assigned to `field`, if it was searched.
    pub fn value_of(&self, field: ParameterField) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.parameter == field)
            .map(|p| p.value)
    }
}

impl fmt::Display for CalibrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.parameters {
            write!(f, "{}={:.4}  ", p.parameter, p.value)?;
        }
        write!(f, "| {}", self.metrics)
    }
}

pub(crate) struct SearchOutcome {
    pub status: SearchStatus,
    pub evaluations: usize,
    pub results: Vec<CalibrationResult>,
}

/// Ranked results of a calibration run; `results[0]` is the best.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationOutcome {
    pub method: CalibrationMethod,
    pub status: SearchStatus,
    /// Trials scored, including failed ones.
    pub evaluations: usize,
    pub results: Vec<CalibrationResult>,
}

impl CalibrationOutcome {
    pub fn best(&self) -> Option<&CalibrationResult> {
        self.results.first()
    }
}

/// Model inputs, metered data, and the parameter space to search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRequest {
    pub floor_spec: FloorSpec,
    pub equipment_spec: EquipmentSpec,
    pub monthly_conditions: Vec<MonthlyCondition>,
    pub actual_data: Vec<ActualDataPoint>,
    #[serde(default)]
    pub comparison_target: ComparisonTarget,
    pub parameter_ranges: Vec<ParameterRange>,
}

impl CalibrationRequest {
    /// Builds a request from a building configuration.
    pub fn new(
        config: &BuildingConfig,
        actual_data: Vec<ActualDataPoint>,
        comparison_target: ComparisonTarget,
        parameter_ranges: Vec<ParameterRange>,
    ) -> Self {
        Self {
            floor_spec: config.floor_spec.clone(),
            equipment_spec: config.equipment_spec.clone(),
            monthly_conditions: config.monthly_conditions.clone(),
            actual_data,
            comparison_target,
            parameter_ranges,
        }
    }

    /// Rejects requests that cannot be searched, before any simulation runs.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: missing or invalid ranges, a repeated
    /// parameter, or metered data unusable for the target.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.parameter_ranges.is_empty() {
            return Err(CalibrationError::NoParameters);
        }
        let mut seen = HashSet::new();
        for range in &self.parameter_ranges {
            range.validate()?;
            if !seen.insert(range.parameter) {
                return Err(CalibrationError::DuplicateParameter(range.parameter.to_string()));
            }
        }
        let months: Vec<u32> = self.monthly_conditions.iter().map(|c| c.month).collect();
        target::validate_actual_data(&months, &self.actual_data, self.comparison_target)
    }
}

fn with_workers<T: Send>(
    workers: Option<usize>,
    op: impl FnOnce() -> T + Send,
) -> Result<T, CalibrationError> {
    match workers {
        Some(n) => Ok(ThreadPoolBuilder::new().num_threads(n).build()?.install(op)),
        None => Ok(op()),
    }
}

/// Searches the parameter space for the assignment that best reproduces the
/// metered data.
///
/// The request's specs are never modified; every trial simulates copies.
///
/// # Errors
///
/// Returns a [`CalibrationError`] if the request fails validation, the grid
/// cannot be indexed, or the worker pool cannot be built. Failed trials do
/// not abort the search.
pub fn calibrate(
    request: &CalibrationRequest,
    method: CalibrationMethod,
    options: &CalibrationOptions,
    cancel: Option<&CancellationToken>,
) -> Result<CalibrationOutcome, CalibrationError> {
    request.validate()?;

    let fields: Vec<ParameterField> = request.parameter_ranges.iter().map(|r| r.parameter).collect();
    let objective = Objective {
        floor_spec: &request.floor_spec,
        equipment_spec: &request.equipment_spec,
        monthly_conditions: &request.monthly_conditions,
        actual_data: &request.actual_data,
        target: request.comparison_target,
        parameters: &fields,
    };
    info!(
        %method,
        target = %request.comparison_target,
        parameters = fields.len(),
        seed = options.seed,
        "calibration started"
    );

    let ranges = &request.parameter_ranges;
    let outcome = with_workers(options.workers, || match method {
        CalibrationMethod::Grid => grid::grid_search(&objective, ranges, options, cancel),
        CalibrationMethod::Optimize => {
            evolution::differential_evolution(&objective, ranges, options, cancel)
        }
    })??;

    info!(
        %method,
        status = %outcome.status,
        evaluations = outcome.evaluations,
        best_rmse = outcome.results.first().map(|r| r.metrics.rmse),
        "calibration finished"
    );
    Ok(CalibrationOutcome {
        method,
        status: outcome.status,
        evaluations: outcome.evaluations,
        results: outcome.results,
    })
}

/// A simulated year scored against metered data.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub target: ComparisonTarget,
    pub metrics: ComparisonMetrics,
    pub results: Vec<MonthlyResult>,
}

/// Simulates `config` and scores it against `actual`.
///
/// # Errors
///
/// Returns a [`CalibrationError`] if the metered data names an unsimulated
/// month or holds no usable value for `target`.
pub fn compare(
    config: &BuildingConfig,
    actual: &[ActualDataPoint],
    target: ComparisonTarget,
) -> Result<Comparison, CalibrationError> {
    let results = BuildingEnergyModel::from_config(config).simulate_year();
    let (simulated, measured) = extract_comparison_values(&results, actual, target)?;
    let metrics = compute_metrics(&simulated, &measured)?;
    Ok(Comparison {
        target,
        metrics,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_request(ranges: Vec<ParameterRange>) -> CalibrationRequest {
        let truth = BuildingConfig::modern_office();
        let actual = BuildingEnergyModel::from_config(&truth)
            .simulate_year()
            .iter()
            .map(|r| ActualDataPoint {
                month: r.month,
                central_total_kwh: Some(r.central_total_kwh),
                local_total_kwh: Some(r.local_total_kwh),
                total_kwh: Some(r.hvac_total_kwh()),
            })
            .collect();
        CalibrationRequest::new(&truth, actual, ComparisonTarget::Total, ranges)
    }

    #[test]
    fn method_parsing() {
        assert_eq!("grid".parse::<CalibrationMethod>().ok(), Some(CalibrationMethod::Grid));
        assert_eq!(
            "optimize".parse::<CalibrationMethod>().ok(),
            Some(CalibrationMethod::Optimize)
        );
        assert!(matches!(
            "annealing".parse::<CalibrationMethod>(),
            Err(CalibrationError::UnknownMethod(m)) if m == "annealing"
        ));
    }

    #[test]
    fn empty_ranges_are_rejected() {
        let req = synthetic_request(vec![]);
        let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None);
        assert!(matches!(out, Err(CalibrationError::NoParameters)));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let req = synthetic_request(vec![
            ParameterRange::with_steps(ParameterField::WallUValue, 0.1, 0.9, 3),
            ParameterRange::with_steps(ParameterField::WallUValue, 0.2, 0.5, 3),
        ]);
        assert!(matches!(
            req.validate(),
            Err(CalibrationError::DuplicateParameter(p)) if p == "floor_spec.wall_u_value"
        ));
    }

    #[test]
    fn inverted_range_is_rejected_before_simulating() {
        let req = synthetic_request(vec![ParameterRange::with_steps(
            ParameterField::LocalAcCop,
            5.0,
            2.0,
            3,
        )]);
        let out = calibrate(&req, CalibrationMethod::Optimize, &CalibrationOptions::default(), None);
        assert!(matches!(out, Err(CalibrationError::InvalidRange { .. })));
    }

    #[test]
    fn grid_returns_sorted_results_with_monthly_rows() {
        let req = synthetic_request(vec![ParameterRange::with_steps(
            ParameterField::WallUValue,
            0.1,
            0.9,
            5,
        )]);
        let out = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None).unwrap();
        assert_eq!(out.status, SearchStatus::Exhaustive);
        assert_eq!(out.evaluations, 5);
        assert_eq!(out.results.len(), 5);
        assert!(out.results.windows(2).all(|w| w[0].metrics.rmse <= w[1].metrics.rmse));
        assert!(out.results.iter().all(|r| r.simulation_results.as_ref().is_some_and(|m| m.len() == 12)));
    }

    #[test]
    fn dedicated_pool_matches_global_pool() {
        let req = synthetic_request(vec![ParameterRange::with_steps(
            ParameterField::WindowUValue,
            1.0,
            3.0,
            4,
        )]);
        let global = calibrate(&req, CalibrationMethod::Grid, &CalibrationOptions::default(), None).unwrap();
        let opts = CalibrationOptions {
            workers: Some(2),
            ..CalibrationOptions::default()
        };
        let pooled = calibrate(&req, CalibrationMethod::Grid, &opts, None).unwrap();
        assert_eq!(global.results, pooled.results);
    }

    #[test]
    fn compare_scores_a_preset() {
        let cfg = BuildingConfig::modern_office();
        let req = synthetic_request(vec![]);
        let cmp = compare(&cfg, &req.actual_data, ComparisonTarget::Central).unwrap();
        assert_eq!(cmp.metrics.rmse, 0.0);
        assert_eq!(cmp.results.len(), 12);
    }

    #[test]
    fn compare_without_usable_values_fails() {
        let cfg = BuildingConfig::modern_office();
        let actual = [ActualDataPoint {
            month: 1,
            central_total_kwh: None,
            local_total_kwh: None,
            total_kwh: None,
        }];
        assert!(matches!(
            compare(&cfg, &actual, ComparisonTarget::Total),
            Err(CalibrationError::Metrics(_))
        ));
    }
}
