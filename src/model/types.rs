//! Core model types: building specifications, monthly conditions, and result rows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Envelope specification for the simulated floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloorSpec {
    /// Floor area (m²).
    pub floor_area: f64,
    /// Ceiling height (m).
    pub ceiling_height: f64,
    /// Exterior wall thermal transmittance (W/m²K).
    pub wall_u_value: f64,
    /// Glazed area (m²).
    pub window_area: f64,
    /// Glazing thermal transmittance (W/m²K).
    pub window_u_value: f64,
    /// Solar heat-gain coefficient of the glazing (0.0–1.0).
    pub solar_heat_gain_coef: f64,
}

/// Internal gains and HVAC plant specification.
///
/// The central system is an air-handling unit plus chiller; the local
/// system is a packaged unit with its own fan and compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentSpec {
    /// Lighting power density (W/m²).
    pub lighting_power_density: f64,
    /// Office equipment power density (W/m²).
    pub oa_equipment_power_density: f64,
    /// Central air-handling unit capacity (kW).
    pub central_ahu_capacity: f64,
    /// Central air-handling unit fan power (kW).
    pub central_ahu_fan_power: f64,
    /// Central chiller capacity (kW).
    pub central_chiller_capacity: f64,
    /// Central chiller coefficient of performance.
    pub central_chiller_cop: f64,
    /// Local unit capacity (kW).
    pub local_ac_capacity: f64,
    /// Local unit coefficient of performance.
    pub local_ac_cop: f64,
    /// Local unit fan power (kW).
    pub local_ac_fan_power: f64,
}

/// Operating conditions for one simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonthlyCondition {
    /// Calendar month (1–12).
    pub month: u32,
    /// Mean outdoor dry-bulb temperature (°C).
    pub outdoor_temp: f64,
    /// Mean outdoor relative humidity (%).
    pub outdoor_humidity: f64,
    /// Indoor temperature setpoint (°C).
    pub indoor_temp_setpoint: f64,
    /// Indoor relative humidity setpoint (%).
    pub indoor_humidity_setpoint: f64,
    /// Supply-air temperature setpoint (°C).
    pub supply_air_temp: f64,
    /// Number of occupants.
    pub occupancy: u32,
    /// Fraction of the floor in use (0.0–1.0).
    pub occupancy_rate: f64,
    /// HVAC operating hours in the month (h).
    pub operation_hours: f64,
}

impl MonthlyCondition {
    /// Outdoor minus indoor temperature (K). Positive means heat flows inward.
    pub fn temp_diff(&self) -> f64 {
        self.outdoor_temp - self.indoor_temp_setpoint
    }
}

/// Sensible heat load breakdown (kW).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensibleLoad {
    pub wall_kw: f64,
    pub window_kw: f64,
    pub solar_kw: f64,
    pub lighting_kw: f64,
    pub oa_equipment_kw: f64,
    pub person_kw: f64,
    pub total_kw: f64,
}

/// Latent heat load breakdown (kW).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatentLoad {
    pub person_kw: f64,
    /// Outdoor-air latent load, floored at zero.
    pub outdoor_air_kw: f64,
    pub total_kw: f64,
}

/// Monthly energy use of the central system (kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CentralEnergy {
    pub ahu_fan_kwh: f64,
    pub chiller_kwh: f64,
    pub total_kwh: f64,
}

/// Monthly energy use of the local system (kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalEnergy {
    pub fan_kwh: f64,
    pub compressor_kwh: f64,
    pub total_kwh: f64,
}

/// Complete record of one simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResult {
    /// Calendar month of the input condition.
    pub month: u32,
    pub outdoor_temp: f64,
    pub outdoor_humidity: f64,
    pub indoor_temp: f64,
    pub indoor_humidity: f64,
    pub supply_air_temp: f64,
    pub occupancy: u32,
    pub occupancy_rate: f64,
    pub operation_hours: f64,
    /// Reference irradiance used for the solar gain (W/m²).
    pub solar_radiation: f64,

    // Load components (kW)
    pub load_wall_kw: f64,
    pub load_window_kw: f64,
    pub load_solar_kw: f64,
    pub load_lighting_kw: f64,
    pub load_oa_equipment_kw: f64,
    pub load_person_sensible_kw: f64,
    pub load_person_latent_kw: f64,
    pub load_outdoor_air_latent_kw: f64,

    // Load totals (kW)
    pub sensible_load_kw: f64,
    pub latent_load_kw: f64,
    pub total_load_kw: f64,
    /// Sensible heat fraction; 0 when the total load is zero.
    pub shf: f64,

    // Energy (kWh)
    pub central_ahu_fan_kwh: f64,
    pub central_chiller_kwh: f64,
    pub central_total_kwh: f64,
    pub local_fan_kwh: f64,
    pub local_compressor_kwh: f64,
    pub local_total_kwh: f64,
    pub lighting_kwh: f64,
    pub oa_equipment_kwh: f64,

    // Psychrometric state points (kJ/kg)
    pub outdoor_enthalpy: f64,
    pub indoor_enthalpy: f64,
}

impl MonthlyResult {
    /// Central plus local HVAC energy (kWh).
    pub fn hvac_total_kwh(&self) -> f64 {
        self.central_total_kwh + self.local_total_kwh
    }
}

impl fmt::Display for MonthlyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m={:>2} | out={:>5.1}°C/{:>3.0}%  in={:>4.1}°C | load: sens={:>7.2} kW  \
             lat={:>6.2} kW  shf={:.2} | central={:>9.1} kWh  local={:>9.1} kWh",
            self.month,
            self.outdoor_temp,
            self.outdoor_humidity,
            self.indoor_temp,
            self.sensible_load_kw,
            self.latent_load_kw,
            self.shf,
            self.central_total_kwh,
            self.local_total_kwh,
        )
    }
}
