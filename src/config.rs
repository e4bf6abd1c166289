//! Building and calibration configuration documents, presets, and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calibration::{
    ActualDataPoint, CalibrationMethod, CalibrationOptions, ComparisonTarget, ParameterRange,
};
use crate::io::actual::load_actual_csv;
use crate::model::types::{EquipmentSpec, FloorSpec, MonthlyCondition};

/// Persisted model inputs: the two specifications and the monthly conditions.
///
/// Saved as JSON and reloaded without precision loss, so a reloaded
/// configuration simulates bit-identically. Also loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    pub floor_spec: FloorSpec,
    pub equipment_spec: EquipmentSpec,
    /// Conditions in simulation order.
    pub monthly_conditions: Vec<MonthlyCondition>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"floor_spec.floor_area"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl BuildingConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["modern", "old"];

    /// High-insulation office with high-efficiency plant, LED lighting and
    /// low-power office equipment.
    pub fn modern_office() -> Self {
        Self {
            name: "modern".to_string(),
            description: "Well-insulated office building with high-efficiency equipment".to_string(),
            floor_spec: FloorSpec {
                floor_area: 1000.0,
                ceiling_height: 3.0,
                wall_u_value: 0.3,
                window_area: 150.0,
                window_u_value: 1.5,
                solar_heat_gain_coef: 0.4,
            },
            equipment_spec: EquipmentSpec {
                lighting_power_density: 8.0,
                oa_equipment_power_density: 12.0,
                central_ahu_capacity: 120.0,
                central_ahu_fan_power: 8.0,
                central_chiller_capacity: 350.0,
                central_chiller_cop: 4.5,
                local_ac_capacity: 60.0,
                local_ac_cop: 4.0,
                local_ac_fan_power: 5.0,
            },
            monthly_conditions: reference_conditions(),
        }
    }

    /// Poorly insulated office with single glazing, fluorescent lighting and
    /// low-efficiency plant.
    pub fn old_office() -> Self {
        Self {
            name: "old".to_string(),
            description: "Older office building with low insulation and low-efficiency equipment"
                .to_string(),
            floor_spec: FloorSpec {
                floor_area: 1000.0,
                ceiling_height: 3.0,
                wall_u_value: 0.8,
                window_area: 200.0,
                window_u_value: 4.0,
                solar_heat_gain_coef: 0.7,
            },
            equipment_spec: EquipmentSpec {
                lighting_power_density: 15.0,
                oa_equipment_power_density: 20.0,
                central_ahu_capacity: 120.0,
                central_ahu_fan_power: 15.0,
                central_chiller_capacity: 350.0,
                central_chiller_cop: 3.0,
                local_ac_capacity: 60.0,
                local_ac_cop: 2.5,
                local_ac_fan_power: 8.0,
            },
            monthly_conditions: reference_conditions(),
        }
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "modern" => Ok(Self::modern_office()),
            "old" => Ok(Self::old_office()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Loads a configuration file, choosing TOML for `.toml` paths and JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the JSON is invalid or contains unknown fields.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::new("json", e.to_string()))
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Serialises the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if serialisation fails.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::new("json", e.to_string()))
    }

    /// Writes the configuration to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if serialisation or writing fails.
    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = self.to_json_string()?;
        fs::write(path, json).map_err(|e| {
            ConfigError::new("config", format!("cannot write \"{}\": {e}", path.display()))
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let fl = &self.floor_spec;
        positive(&mut errors, "floor_spec.floor_area", fl.floor_area);
        positive(&mut errors, "floor_spec.ceiling_height", fl.ceiling_height);
        non_negative(&mut errors, "floor_spec.wall_u_value", fl.wall_u_value);
        non_negative(&mut errors, "floor_spec.window_area", fl.window_area);
        non_negative(&mut errors, "floor_spec.window_u_value", fl.window_u_value);
        within(&mut errors, "floor_spec.solar_heat_gain_coef", fl.solar_heat_gain_coef, 0.0, 1.0);

        let eq = &self.equipment_spec;
        for (field, value) in [
            ("lighting_power_density", eq.lighting_power_density),
            ("oa_equipment_power_density", eq.oa_equipment_power_density),
            ("central_ahu_capacity", eq.central_ahu_capacity),
            ("central_ahu_fan_power", eq.central_ahu_fan_power),
            ("central_chiller_capacity", eq.central_chiller_capacity),
            ("local_ac_capacity", eq.local_ac_capacity),
            ("local_ac_fan_power", eq.local_ac_fan_power),
        ] {
            non_negative(&mut errors, &format!("equipment_spec.{field}"), value);
        }
        positive(&mut errors, "equipment_spec.central_chiller_cop", eq.central_chiller_cop);
        positive(&mut errors, "equipment_spec.local_ac_cop", eq.local_ac_cop);

        if self.monthly_conditions.is_empty() {
            errors.push(ConfigError::new("monthly_conditions", "must not be empty"));
        }
        for (i, c) in self.monthly_conditions.iter().enumerate() {
            let path = |field: &str| format!("monthly_conditions[{i}].{field}");
            finite(&mut errors, &path("outdoor_temp"), c.outdoor_temp);
            finite(&mut errors, &path("indoor_temp_setpoint"), c.indoor_temp_setpoint);
            finite(&mut errors, &path("supply_air_temp"), c.supply_air_temp);
            within(&mut errors, &path("outdoor_humidity"), c.outdoor_humidity, 0.0, 100.0);
            within(&mut errors, &path("indoor_humidity_setpoint"), c.indoor_humidity_setpoint, 0.0, 100.0);
            within(&mut errors, &path("occupancy_rate"), c.occupancy_rate, 0.0, 1.0);
            non_negative(&mut errors, &path("operation_hours"), c.operation_hours);
        }

        errors
    }
}

/// Twelve months of Tokyo reference operating conditions.
fn reference_conditions() -> Vec<MonthlyCondition> {
    // (month, outdoor °C, outdoor %RH, indoor °C, indoor %RH, supply °C, occupancy rate, hours)
    const TABLE: [(u32, f64, f64, f64, f64, f64, f64, f64); 12] = [
        (1, 5.2, 52.0, 22.0, 45.0, 20.0, 0.85, 200.0),
        (2, 5.7, 53.0, 22.0, 45.0, 20.0, 0.85, 180.0),
        (3, 8.7, 55.0, 22.0, 50.0, 20.0, 0.85, 200.0),
        (4, 13.9, 60.0, 24.0, 50.0, 18.0, 0.80, 200.0),
        (5, 18.2, 65.0, 24.0, 55.0, 18.0, 0.80, 200.0),
        (6, 21.4, 75.0, 26.0, 60.0, 16.0, 0.75, 200.0),
        (7, 25.0, 78.0, 26.0, 60.0, 16.0, 0.70, 200.0),
        (8, 26.4, 77.0, 26.0, 60.0, 16.0, 0.60, 180.0),
        (9, 22.8, 75.0, 26.0, 60.0, 18.0, 0.75, 200.0),
        (10, 17.5, 68.0, 24.0, 55.0, 18.0, 0.85, 200.0),
        (11, 12.1, 60.0, 22.0, 50.0, 20.0, 0.85, 200.0),
        (12, 7.6, 56.0, 22.0, 45.0, 20.0, 0.80, 180.0),
    ];
    TABLE
        .iter()
        .map(|&(month, out_t, out_rh, in_t, in_rh, supply, rate, hours)| MonthlyCondition {
            month,
            outdoor_temp: out_t,
            outdoor_humidity: out_rh,
            indoor_temp_setpoint: in_t,
            indoor_humidity_setpoint: in_rh,
            supply_air_temp: supply,
            occupancy: 50,
            occupancy_rate: rate,
            operation_hours: hours,
        })
        .collect()
}

fn finite(errors: &mut Vec<ConfigError>, field: &str, value: f64) -> bool {
    if value.is_finite() {
        true
    } else {
        errors.push(ConfigError::new(field, "must be a finite number"));
        false
    }
}

fn positive(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if finite(errors, field, value) && value <= 0.0 {
        errors.push(ConfigError::new(field, "must be > 0"));
    }
}

fn non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if finite(errors, field, value) && value < 0.0 {
        errors.push(ConfigError::new(field, "must be >= 0"));
    }
}

fn within(errors: &mut Vec<ConfigError>, field: &str, value: f64, lo: f64, hi: f64) {
    if finite(errors, field, value) && !(lo..=hi).contains(&value) {
        errors.push(ConfigError::new(field, format!("must be in [{lo}, {hi}]")));
    }
}

/// Calibration run parsed from TOML: method, target, search limits,
/// parameter ranges, and metered data (inline or from a CSV file).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    /// `"grid"` or `"optimize"`; checked by [`CalibrationConfig::method`].
    #[serde(default = "default_method")]
    pub method: String,
    /// Output series compared against the metered data.
    #[serde(default = "default_target")]
    pub target: ComparisonTarget,
    /// Random seed for grid sampling and the optimizer.
    pub seed: Option<u64>,
    /// Worker thread count; the global pool is used when absent.
    pub workers: Option<usize>,
    /// Optimizer generation limit.
    pub max_iterations: Option<usize>,
    /// Grid size above which combinations are sampled.
    pub max_combinations: Option<usize>,
    /// Parameter ranges to search.
    #[serde(default)]
    pub parameters: Vec<ParameterRange>,
    /// Inline metered data.
    #[serde(default)]
    pub actual: Vec<ActualDataPoint>,
    /// Metered data CSV, relative to the config file.
    pub actual_csv: Option<PathBuf>,
}

fn default_method() -> String {
    "grid".to_string()
}

fn default_target() -> ComparisonTarget {
    ComparisonTarget::Total
}

impl CalibrationConfig {
    /// Parses a calibration run from a TOML file.
    ///
    /// A relative `actual_csv` path is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("calibration", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let (Some(csv), Some(dir)) = (cfg.actual_csv.as_mut(), path.parent()) {
            if csv.is_relative() {
                *csv = dir.join(&*csv);
            }
        }
        Ok(cfg)
    }

    /// Parses a calibration run from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Parses the configured method.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming `method` if it is not `grid` or `optimize`.
    pub fn method(&self) -> Result<CalibrationMethod, ConfigError> {
        self.method
            .parse()
            .map_err(|e: crate::error::CalibrationError| ConfigError::new("method", e.to_string()))
    }

    /// Search options with this file's overrides applied to the defaults.
    pub fn options(&self) -> CalibrationOptions {
        let defaults = CalibrationOptions::default();
        CalibrationOptions {
            seed: self.seed.unwrap_or(defaults.seed),
            workers: self.workers.or(defaults.workers),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            max_combinations: self.max_combinations.unwrap_or(defaults.max_combinations),
            ..defaults
        }
    }

    /// Returns the metered data, reading `actual_csv` when configured.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the CSV cannot be read.
    pub fn actual_data(&self) -> Result<Vec<ActualDataPoint>, ConfigError> {
        match &self.actual_csv {
            Some(path) => load_actual_csv(path).map_err(|e| {
                ConfigError::new("actual_csv", format!("cannot load \"{}\": {e}", path.display()))
            }),
            None => Ok(self.actual.clone()),
        }
    }

    /// Validates all fields and returns a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Err(e) = self.method() {
            errors.push(e);
        }
        if self.parameters.is_empty() {
            errors.push(ConfigError::new("parameters", "at least one range is required"));
        }
        for (i, range) in self.parameters.iter().enumerate() {
            if let Err(e) = range.validate() {
                errors.push(ConfigError::new(format!("parameters[{i}]"), e.to_string()));
            }
        }
        match (self.actual.is_empty(), self.actual_csv.is_some()) {
            (true, false) => errors.push(ConfigError::new(
                "actual",
                "provide metered data inline or via actual_csv",
            )),
            (false, true) => errors.push(ConfigError::new(
                "actual_csv",
                "inline actual data and actual_csv are mutually exclusive",
            )),
            _ => {}
        }
        if self.workers == Some(0) {
            errors.push(ConfigError::new("workers", "must be > 0"));
        }
        if self.max_combinations == Some(0) {
            errors.push(ConfigError::new("max_combinations", "must be > 0"));
        }
        errors
    }
}
