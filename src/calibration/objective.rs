//! Scoring of one parameter assignment against metered data.

use crate::error::CalibrationError;
use crate::model::engine::BuildingEnergyModel;
use crate::model::types::{EquipmentSpec, FloorSpec, MonthlyCondition, MonthlyResult};

use super::metrics::{ComparisonMetrics, compute_metrics};
use super::parameter::{ParameterField, ParameterValue, apply_parameters};
use super::target::{ActualDataPoint, ComparisonTarget, extract_comparison_values};

/// Outcome of one successful trial.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: ComparisonMetrics,
    pub results: Vec<MonthlyResult>,
}

/// Maps a vector of parameter values to comparison metrics.
///
/// Borrowed inputs are never modified; each evaluation simulates copies of
/// the specs with the overrides applied. Safe to share across threads.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    pub floor_spec: &'a FloorSpec,
    pub equipment_spec: &'a EquipmentSpec,
    pub monthly_conditions: &'a [MonthlyCondition],
    pub actual_data: &'a [ActualDataPoint],
    pub target: ComparisonTarget,
    pub parameters: &'a [ParameterField],
}

impl Objective<'_> {
    /// Pairs each searched field with its value, in search order.
    pub fn assignment(&self, values: &[f64]) -> Vec<ParameterValue> {
        self.parameters
            .iter()
            .zip(values)
            .map(|(&parameter, &value)| ParameterValue { parameter, value })
            .collect()
    }

    /// Simulates the year with `values` applied and scores it.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::TrialFailed`] if the comparison cannot be
    /// computed or the RMSE is not finite.
    pub fn evaluate(&self, values: &[f64]) -> Result<Evaluation, CalibrationError> {
        let (floor, equipment) =
            apply_parameters(self.floor_spec, self.equipment_spec, &self.assignment(values));
        let results =
            BuildingEnergyModel::new(floor, equipment, self.monthly_conditions.to_vec()).simulate_year();
        let (simulated, actual) = extract_comparison_values(&results, self.actual_data, self.target)
            .map_err(|e| CalibrationError::TrialFailed(e.to_string()))?;
        let metrics = compute_metrics(&simulated, &actual)
            .map_err(|e| CalibrationError::TrialFailed(e.to_string()))?;
        if !metrics.rmse.is_finite() {
            return Err(CalibrationError::TrialFailed(format!(
                "non-finite RMSE ({})",
                metrics.rmse
            )));
        }
        Ok(Evaluation { metrics, results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildingConfig;

    fn actual_from(config: &BuildingConfig) -> Vec<ActualDataPoint> {
        BuildingEnergyModel::from_config(config)
            .simulate_year()
            .iter()
            .map(|r| ActualDataPoint {
                month: r.month,
                central_total_kwh: Some(r.central_total_kwh),
                local_total_kwh: Some(r.local_total_kwh),
                total_kwh: Some(r.hvac_total_kwh()),
            })
            .collect()
    }

    #[test]
    fn ground_truth_scores_zero() {
        let cfg = BuildingConfig::modern_office();
        let actual = actual_from(&cfg);
        let fields = [ParameterField::WallUValue];
        let objective = Objective {
            floor_spec: &cfg.floor_spec,
            equipment_spec: &cfg.equipment_spec,
            monthly_conditions: &cfg.monthly_conditions,
            actual_data: &actual,
            target: ComparisonTarget::Total,
            parameters: &fields,
        };
        let eval = objective.evaluate(&[cfg.floor_spec.wall_u_value]).unwrap();
        assert_eq!(eval.metrics.rmse, 0.0);
        assert_eq!(eval.results.len(), 12);

        let off = objective.evaluate(&[0.9]).unwrap();
        assert!(off.metrics.rmse > 0.0);
        // inputs untouched
        assert_eq!(cfg.floor_spec.wall_u_value, 0.3);
    }

    #[test]
    fn zero_cop_fails_the_trial() {
        let cfg = BuildingConfig::modern_office();
        let actual = actual_from(&cfg);
        let fields = [ParameterField::CentralChillerCop];
        let objective = Objective {
            floor_spec: &cfg.floor_spec,
            equipment_spec: &cfg.equipment_spec,
            monthly_conditions: &cfg.monthly_conditions,
            actual_data: &actual,
            target: ComparisonTarget::Central,
            parameters: &fields,
        };
        assert!(matches!(
            objective.evaluate(&[0.0]),
            Err(CalibrationError::TrialFailed(_))
        ));
    }
}
