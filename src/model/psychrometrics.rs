//! Moist-air property approximations.
//!
//! All functions are pure and safe to call from any thread.

/// Standard atmospheric pressure (Pa).
pub const ATMOSPHERIC_PRESSURE_PA: f64 = 101_325.0;

/// Ratio of the molar masses of water vapour and dry air.
const MOLAR_MASS_RATIO: f64 = 0.622;

/// Saturation vapour pressure over water (Pa), Antoine/Tetens form.
pub fn saturation_pressure(temp_c: f64) -> f64 {
    611.0 * (17.27 * temp_c / (temp_c + 237.3)).exp()
}

/// Absolute humidity (kg water / kg dry air) at `temp_c` and relative humidity in percent.
///
/// The result is not physical when the partial vapour pressure reaches
/// atmospheric pressure; callers must keep inputs within normal air states.
pub fn absolute_humidity(temp_c: f64, rel_humidity_pct: f64) -> f64 {
    let p_v = saturation_pressure(temp_c) * rel_humidity_pct / 100.0;
    MOLAR_MASS_RATIO * p_v / (ATMOSPHERIC_PRESSURE_PA - p_v)
}

/// Specific enthalpy of moist air (kJ/kg dry air).
pub fn enthalpy(temp_c: f64, abs_humidity: f64) -> f64 {
    1.005 * temp_c + abs_humidity * (2501.0 + 1.846 * temp_c)
}

/// Enthalpy of an air state given as dry-bulb temperature and relative humidity.
pub fn enthalpy_at(temp_c: f64, rel_humidity_pct: f64) -> f64 {
    enthalpy(temp_c, absolute_humidity(temp_c, rel_humidity_pct))
}
