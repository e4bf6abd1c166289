//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use bem_sim::calibration::{ActualDataPoint, ParameterField, ParameterValue, apply_parameters};
use bem_sim::config::BuildingConfig;
use bem_sim::model::{BuildingEnergyModel, MonthlyCondition};

/// Modern office preset (COP 4.5 / 4.0, 12 Tokyo reference months).
pub fn modern() -> BuildingConfig {
    BuildingConfig::modern_office()
}

/// The July reference condition with 50 occupants at 70% occupancy.
pub fn july_condition() -> MonthlyCondition {
    MonthlyCondition {
        month: 7,
        outdoor_temp: 25.0,
        outdoor_humidity: 78.0,
        indoor_temp_setpoint: 26.0,
        indoor_humidity_setpoint: 60.0,
        supply_air_temp: 16.0,
        occupancy: 50,
        occupancy_rate: 0.70,
        operation_hours: 200.0,
    }
}

/// `config` with one field overridden.
pub fn with_parameter(config: &BuildingConfig, parameter: ParameterField, value: f64) -> BuildingConfig {
    let (floor_spec, equipment_spec) = apply_parameters(
        &config.floor_spec,
        &config.equipment_spec,
        &[ParameterValue { parameter, value }],
    );
    BuildingConfig {
        floor_spec,
        equipment_spec,
        ..config.clone()
    }
}

/// Metered data reproduced exactly by simulating `config`.
pub fn synthetic_actual(config: &BuildingConfig) -> Vec<ActualDataPoint> {
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
