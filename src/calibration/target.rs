//! Metered data and the simulated series it is compared against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::model::types::MonthlyResult;

/// Output series compared against metered data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComparisonTarget {
    /// Central system energy.
    #[serde(rename = "central_total_kwh", alias = "central_total_kWh")]
    Central,
    /// Local system energy.
    #[serde(rename = "local_total_kwh", alias = "local_total_kWh")]
    Local,
    /// Central plus local energy.
    #[default]
    #[serde(rename = "total_kwh", alias = "total_kWh")]
    Total,
}

impl ComparisonTarget {
    pub fn name(self) -> &'static str {
        match self {
            Self::Central => "central_total_kwh",
            Self::Local => "local_total_kwh",
            Self::Total => "total_kwh",
        }
    }

    /// Simulated value of this series for one month.
    pub fn value(self, result: &MonthlyResult) -> f64 {
        match self {
            Self::Central => result.central_total_kwh,
            Self::Local => result.local_total_kwh,
            Self::Total => result.hvac_total_kwh(),
        }
    }
}

impl fmt::Display for ComparisonTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComparisonTarget {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "central_total_kwh" | "central_total_kWh" => Ok(Self::Central),
            "local_total_kwh" | "local_total_kWh" => Ok(Self::Local),
            "total_kwh" | "total_kWh" => Ok(Self::Total),
            other => Err(CalibrationError::UnknownTarget(other.to_string())),
        }
    }
}

/// One month of metered energy. Columns may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActualDataPoint {
    pub month: u32,
    #[serde(default, alias = "central_total_kWh")]
    pub central_total_kwh: Option<f64>,
    #[serde(default, alias = "local_total_kWh")]
    pub local_total_kwh: Option<f64>,
    #[serde(default, alias = "total_kWh")]
    pub total_kwh: Option<f64>,
}

impl ActualDataPoint {
    /// Metered value for `target`, if recorded.
    pub fn value(&self, target: ComparisonTarget) -> Option<f64> {
        match target {
            ComparisonTarget::Central => self.central_total_kwh,
            ComparisonTarget::Local => self.local_total_kwh,
            ComparisonTarget::Total => self.total_kwh,
        }
    }
}

/// Checks that metered data references only simulated months and holds at
/// least one usable value for `target`.
///
/// # Errors
///
/// Returns [`CalibrationError::InvalidActualData`] for the first row naming an
/// unknown month and [`CalibrationError::InsufficientData`] if no row has a
/// finite value for the target.
pub fn validate_actual_data(
    months: &[u32],
    actual: &[ActualDataPoint],
    target: ComparisonTarget,
) -> Result<(), CalibrationError> {
    for (row, point) in actual.iter().enumerate() {
        if !months.contains(&point.month) {
            return Err(CalibrationError::InvalidActualData {
                row,
                month: point.month,
                reason: "month is not among the simulated conditions".to_string(),
            });
        }
    }
    let usable = actual
        .iter()
        .filter_map(|p| p.value(target))
        .any(|v| !v.is_nan());
    if !usable {
        return Err(CalibrationError::InsufficientData(format!(
            "actual data has no {target} values"
        )));
    }
    Ok(())
}

/// Pairs each metered row with the simulated row of the same month.
///
/// Returns `(simulated, actual)` for the rows that carry a value for `target`.
///
/// # Errors
///
/// Returns [`CalibrationError::InvalidActualData`] if a row names a month that
/// was not simulated.
pub fn extract_comparison_values(
    results: &[MonthlyResult],
    actual: &[ActualDataPoint],
    target: ComparisonTarget,
) -> Result<(Vec<f64>, Vec<f64>), CalibrationError> {
    let mut simulated = Vec::with_capacity(actual.len());
    let mut measured = Vec::with_capacity(actual.len());
    for (row, point) in actual.iter().enumerate() {
        let Some(result) = results.iter().find(|r| r.month == point.month) else {
            return Err(CalibrationError::InvalidActualData {
                row,
                month: point.month,
                reason: "month is not among the simulated conditions".to_string(),
            });
        };
        if let Some(value) = point.value(target) {
            simulated.push(target.value(result));
            measured.push(value);
        }
    }
    Ok((simulated, measured))
}
