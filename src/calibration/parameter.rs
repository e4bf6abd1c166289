//! Typed calibration parameters and their search ranges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;
use crate::model::types::{EquipmentSpec, FloorSpec};

/// A numeric field of [`FloorSpec`] or [`EquipmentSpec`] that calibration can override.
///
/// Written and parsed as a dotted path such as `floor_spec.wall_u_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParameterField {
    FloorArea,
    CeilingHeight,
    WallUValue,
    WindowArea,
    WindowUValue,
    SolarHeatGainCoef,
    LightingPowerDensity,
    OaEquipmentPowerDensity,
    CentralAhuCapacity,
    CentralAhuFanPower,
    CentralChillerCapacity,
    CentralChillerCop,
    LocalAcCapacity,
    LocalAcCop,
    LocalAcFanPower,
}

impl ParameterField {
    pub const ALL: [ParameterField; 15] = [
        Self::FloorArea,
        Self::CeilingHeight,
        Self::WallUValue,
        Self::WindowArea,
        Self::WindowUValue,
        Self::SolarHeatGainCoef,
        Self::LightingPowerDensity,
        Self::OaEquipmentPowerDensity,
        Self::CentralAhuCapacity,
        Self::CentralAhuFanPower,
        Self::CentralChillerCapacity,
        Self::CentralChillerCop,
        Self::LocalAcCapacity,
        Self::LocalAcCop,
        Self::LocalAcFanPower,
    ];

    /// Dotted path naming the spec and field.
    pub fn path(self) -> &'static str {
        match self {
            Self::FloorArea => "floor_spec.floor_area",
            Self::CeilingHeight => "floor_spec.ceiling_height",
            Self::WallUValue => "floor_spec.wall_u_value",
            Self::WindowArea => "floor_spec.window_area",
            Self::WindowUValue => "floor_spec.window_u_value",
            Self::SolarHeatGainCoef => "floor_spec.solar_heat_gain_coef",
            Self::LightingPowerDensity => "equipment_spec.lighting_power_density",
            Self::OaEquipmentPowerDensity => "equipment_spec.oa_equipment_power_density",
            Self::CentralAhuCapacity => "equipment_spec.central_ahu_capacity",
            Self::CentralAhuFanPower => "equipment_spec.central_ahu_fan_power",
            Self::CentralChillerCapacity => "equipment_spec.central_chiller_capacity",
            Self::CentralChillerCop => "equipment_spec.central_chiller_cop",
            Self::LocalAcCapacity => "equipment_spec.local_ac_capacity",
            Self::LocalAcCop => "equipment_spec.local_ac_cop",
            Self::LocalAcFanPower => "equipment_spec.local_ac_fan_power",
        }
    }

    /// Mutable lens onto the field within a spec pair.
    pub fn slot<'a>(self, floor: &'a mut FloorSpec, equipment: &'a mut EquipmentSpec) -> &'a mut f64 {
        match self {
            Self::FloorArea => &mut floor.floor_area,
            Self::CeilingHeight => &mut floor.ceiling_height,
            Self::WallUValue => &mut floor.wall_u_value,
            Self::WindowArea => &mut floor.window_area,
            Self::WindowUValue => &mut floor.window_u_value,
            Self::SolarHeatGainCoef => &mut floor.solar_heat_gain_coef,
            Self::LightingPowerDensity => &mut equipment.lighting_power_density,
            Self::OaEquipmentPowerDensity => &mut equipment.oa_equipment_power_density,
            Self::CentralAhuCapacity => &mut equipment.central_ahu_capacity,
            Self::CentralAhuFanPower => &mut equipment.central_ahu_fan_power,
            Self::CentralChillerCapacity => &mut equipment.central_chiller_capacity,
            Self::CentralChillerCop => &mut equipment.central_chiller_cop,
            Self::LocalAcCapacity => &mut equipment.local_ac_capacity,
            Self::LocalAcCop => &mut equipment.local_ac_cop,
            Self::LocalAcFanPower => &mut equipment.local_ac_fan_power,
        }
    }

    /// Reads the field's current value.
    pub fn get(self, floor: &FloorSpec, equipment: &EquipmentSpec) -> f64 {
        match self {
            Self::FloorArea => floor.floor_area,
            Self::CeilingHeight => floor.ceiling_height,
            Self::WallUValue => floor.wall_u_value,
            Self::WindowArea => floor.window_area,
            Self::WindowUValue => floor.window_u_value,
            Self::SolarHeatGainCoef => floor.solar_heat_gain_coef,
            Self::LightingPowerDensity => equipment.lighting_power_density,
            Self::OaEquipmentPowerDensity => equipment.oa_equipment_power_density,
            Self::CentralAhuCapacity => equipment.central_ahu_capacity,
            Self::CentralAhuFanPower => equipment.central_ahu_fan_power,
            Self::CentralChillerCapacity => equipment.central_chiller_capacity,
            Self::CentralChillerCop => equipment.central_chiller_cop,
            Self::LocalAcCapacity => equipment.local_ac_capacity,
            Self::LocalAcCop => equipment.local_ac_cop,
            Self::LocalAcFanPower => equipment.local_ac_fan_power,
        }
    }
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for ParameterField {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.path() == s)
            .ok_or_else(|| CalibrationError::UnknownParameter(s.to_string()))
    }
}

impl TryFrom<String> for ParameterField {
    type Error = CalibrationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ParameterField> for String {
    fn from(field: ParameterField) -> Self {
        field.path().to_string()
    }
}

/// Default number of grid points when a range gives no explicit step.
pub const DEFAULT_NUM_STEPS: usize = 10;

fn default_num_steps() -> usize {
    DEFAULT_NUM_STEPS
}

/// Search range for one parameter.
///
/// The grid uses `step` when given, otherwise `num_steps` evenly spaced
/// points including both ends. The optimizer uses only the bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterRange {
    pub parameter: ParameterField,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default = "default_num_steps")]
    pub num_steps: usize,
}

impl ParameterRange {
    /// A range sampled at `num_steps` evenly spaced points.
    pub fn with_steps(parameter: ParameterField, min_value: f64, max_value: f64, num_steps: usize) -> Self {
        Self {
            parameter,
            min_value,
            max_value,
            step: None,
            num_steps,
        }
    }

    /// A range sampled every `step` from `min_value`.
    pub fn with_step(parameter: ParameterField, min_value: f64, max_value: f64, step: f64) -> Self {
        Self {
            parameter,
            min_value,
            max_value,
            step: Some(step),
            num_steps: DEFAULT_NUM_STEPS,
        }
    }

    /// Checks bounds and spacing.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidRange`] naming the parameter.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let invalid = |reason: String| CalibrationError::InvalidRange {
            parameter: self.parameter.to_string(),
            reason,
        };
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            return Err(invalid("bounds must be finite".to_string()));
        }
        if self.min_value > self.max_value {
            return Err(invalid(format!(
                "min_value ({}) must be <= max_value ({})",
                self.min_value, self.max_value
            )));
        }
        match self.step {
            Some(step) if !(step.is_finite() && step > 0.0) => {
                Err(invalid(format!("step ({step}) must be a positive number")))
            }
            None if self.num_steps == 0 => Err(invalid("num_steps must be >= 1".to_string())),
            _ => Ok(()),
        }
    }

    /// Number of grid points, or `None` if it does not fit in `usize`.
    pub fn grid_len(&self) -> Option<usize> {
        match self.step {
            Some(step) => {
                // tolerate accumulated rounding at the upper end
                let intervals = ((self.max_value - self.min_value) / step + 1e-9).floor();
                if intervals.is_nan() || intervals >= usize::MAX as f64 {
                    return None;
                }
                (intervals as usize).checked_add(1)
            }
            None => Some(self.num_steps.max(1)),
        }
    }

    /// Grid point `index`, ascending from `min_value`.
    ///
    /// Points never exceed `max_value`; evenly spaced grids end exactly on it.
    pub fn grid_value(&self, index: usize) -> f64 {
        let (lo, hi) = (self.min_value, self.max_value);
        match self.step {
            Some(step) => (lo + index as f64 * step).min(hi),
            None if self.num_steps <= 1 => lo,
            None if index >= self.num_steps - 1 => hi,
            None => {
                let delta = (hi - lo) / (self.num_steps - 1) as f64;
                (lo + index as f64 * delta).min(hi)
            }
        }
    }
}

/// One parameter override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub parameter: ParameterField,
    pub value: f64,
}

/// Applies overrides to copies of the specs, leaving the originals untouched.
pub fn apply_parameters(
    floor: &FloorSpec,
    equipment: &EquipmentSpec,
    values: &[ParameterValue],
) -> (FloorSpec, EquipmentSpec) {
    let mut floor = floor.clone();
    let mut equipment = equipment.clone();
    for pv in values {
        *pv.parameter.slot(&mut floor, &mut equipment) = pv.value;
    }
    (floor, equipment)
}
