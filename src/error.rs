//! Error types for comparison and calibration.

use thiserror::Error;

/// Failure to compute comparison metrics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("simulated and actual series differ in length ({simulated} vs {actual})")]
    LengthMismatch { simulated: usize, actual: usize },
    #[error("insufficient data: no valid (simulated, actual) pairs to compare")]
    InsufficientData,
}

/// Failure to set up or run a calibration.
///
/// Setup variants are raised before any simulation runs. [`CalibrationError::Metrics`]
/// surfaces from a one-off comparison, and [`CalibrationError::TrialFailed`]
/// is scored as a penalty inside a search rather than returned.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("calibration requires at least one parameter range")]
    NoParameters,
    #[error("unknown parameter `{0}` (expected `floor_spec.<field>` or `equipment_spec.<field>`)")]
    UnknownParameter(String),
    #[error("parameter `{0}` is listed more than once")]
    DuplicateParameter(String),
    #[error("invalid range for `{parameter}`: {reason}")]
    InvalidRange { parameter: String, reason: String },
    #[error("unknown calibration method `{0}` (expected \"grid\" or \"optimize\")")]
    UnknownMethod(String),
    #[error("unknown comparison target `{0}` (expected central_total_kwh, local_total_kwh or total_kwh)")]
    UnknownTarget(String),
    #[error("actual data row {row} (month {month}): {reason}")]
    InvalidActualData { row: usize, month: u32, reason: String },
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("grid cannot be indexed: {0}")]
    GridTooLarge(String),
    #[error("trial failed: {0}")]
    TrialFailed(String),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
