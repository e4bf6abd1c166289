//! Monthly sensible and latent heat loads of a single floor.

use super::psychrometrics::absolute_humidity;
use super::types::{EquipmentSpec, FloorSpec, LatentLoad, MonthlyCondition, SensibleLoad};

/// Exterior wall area as a fraction of floor area. A fixed geometric
/// simplification rather than a measured input.
pub const EXTERIOR_WALL_AREA_RATIO: f64 = 0.4;

/// Sensible heat emitted per occupant (W).
pub const PERSON_SENSIBLE_HEAT_W: f64 = 60.0;

/// Latent heat emitted per occupant (W).
pub const PERSON_LATENT_HEAT_W: f64 = 40.0;

/// Outdoor air supplied per occupant (m³/h).
pub const OUTDOOR_AIR_RATE_M3H_PER_PERSON: f64 = 30.0;

/// Density of air (kg/m³).
pub const AIR_DENSITY: f64 = 1.2;

/// Latent heat of vaporisation of water (kJ/kg).
pub const LATENT_HEAT_VAPORIZATION: f64 = 2501.0;

/// Irradiance used for months missing from [`SOLAR_RADIATION_BY_MONTH`] (W/m²).
pub const DEFAULT_SOLAR_RADIATION: f64 = 150.0;

/// Reference mean irradiance on glazing for months 1..=12 (W/m², Tokyo).
pub const SOLAR_RADIATION_BY_MONTH: [f64; 12] = [
    120.0, 150.0, 180.0, 200.0, 220.0, 200.0, 220.0, 200.0, 180.0, 150.0, 120.0, 100.0,
];

/// Reference irradiance for a calendar month, falling back to
/// [`DEFAULT_SOLAR_RADIATION`] outside 1..=12.
pub fn solar_radiation(month: u32) -> f64 {
    match month {
        1..=12 => SOLAR_RADIATION_BY_MONTH[(month - 1) as usize],
        _ => DEFAULT_SOLAR_RADIATION,
    }
}

/// Heat load calculator bound to one floor specification.
#[derive(Debug, Clone)]
pub struct HeatLoadCalculator {
    floor: FloorSpec,
}

impl HeatLoadCalculator {
    /// Creates a calculator for the given floor.
    pub fn new(floor: FloorSpec) -> Self {
        Self { floor }
    }

    /// Returns the floor specification this calculator was built with.
    pub fn floor(&self) -> &FloorSpec {
        &self.floor
    }

    /// Computes the sensible load breakdown for one month.
    ///
    /// Conduction terms are negative when the outdoor air is colder than the
    /// setpoint; the total is the plain sum of all six components.
    pub fn sensible_load(&self, condition: &MonthlyCondition, equipment: &EquipmentSpec) -> SensibleLoad {
        let floor = &self.floor;
        let dt = condition.temp_diff();

        let wall_area = floor.floor_area * EXTERIOR_WALL_AREA_RATIO;
        let wall_kw = floor.wall_u_value * wall_area * dt / 1000.0;
        let window_kw = floor.window_u_value * floor.window_area * dt / 1000.0;
        let solar_kw =
            floor.window_area * floor.solar_heat_gain_coef * solar_radiation(condition.month) / 1000.0;

        let in_use_area = floor.floor_area * condition.occupancy_rate;
        let lighting_kw = equipment.lighting_power_density * in_use_area / 1000.0;
        let oa_equipment_kw = equipment.oa_equipment_power_density * in_use_area / 1000.0;
        let person_kw = PERSON_SENSIBLE_HEAT_W * f64::from(condition.occupancy) / 1000.0;

        SensibleLoad {
            wall_kw,
            window_kw,
            solar_kw,
            lighting_kw,
            oa_equipment_kw,
            person_kw,
            total_kw: wall_kw + window_kw + solar_kw + lighting_kw + oa_equipment_kw + person_kw,
        }
    }

    /// Computes the latent load breakdown for one month.
    ///
    /// Drier outdoor air would give a negative outdoor-air term; it is floored
    /// at zero since dehumidification credit is not modelled.
    pub fn latent_load(&self, condition: &MonthlyCondition) -> LatentLoad {
        let occupants = f64::from(condition.occupancy);
        let person_kw = PERSON_LATENT_HEAT_W * occupants / 1000.0;

        let w_out = absolute_humidity(condition.outdoor_temp, condition.outdoor_humidity);
        let w_in = absolute_humidity(condition.indoor_temp_setpoint, condition.indoor_humidity_setpoint);
        let air_volume_m3h = OUTDOOR_AIR_RATE_M3H_PER_PERSON * occupants;
        let raw_outdoor_kw =
            air_volume_m3h * AIR_DENSITY * (w_out - w_in) * LATENT_HEAT_VAPORIZATION / 3600.0;
        let outdoor_air_kw = raw_outdoor_kw.max(0.0);

        LatentLoad {
            person_kw,
            outdoor_air_kw,
            total_kw: person_kw + outdoor_air_kw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn floor() -> FloorSpec {
        FloorSpec {
            floor_area: 1000.0,
            ceiling_height: 3.0,
            wall_u_value: 0.3,
            window_area: 150.0,
            window_u_value: 1.5,
            solar_heat_gain_coef: 0.4,
        }
    }

    fn equipment() -> EquipmentSpec {
        EquipmentSpec {
            lighting_power_density: 8.0,
            oa_equipment_power_density: 12.0,
            central_ahu_capacity: 120.0,
            central_ahu_fan_power: 8.0,
            central_chiller_capacity: 350.0,
            central_chiller_cop: 4.5,
            local_ac_capacity: 60.0,
            local_ac_cop: 4.0,
            local_ac_fan_power: 5.0,
        }
    }

    fn july() -> MonthlyCondition {
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

    #[test]
    fn solar_lookup_and_default() {
        assert_eq!(solar_radiation(1), 120.0);
        assert_eq!(solar_radiation(7), 220.0);
        assert_eq!(solar_radiation(12), 100.0);
        assert_eq!(solar_radiation(0), DEFAULT_SOLAR_RADIATION);
        assert_eq!(solar_radiation(13), DEFAULT_SOLAR_RADIATION);
    }

    #[test]
    fn sensible_components_follow_formulas() {
        let calc = HeatLoadCalculator::new(floor());
        let s = calc.sensible_load(&july(), &equipment());

        // ΔT = -1 K
        assert_abs_diff_eq!(s.wall_kw, 0.3 * 400.0 * -1.0 / 1000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.window_kw, 1.5 * 150.0 * -1.0 / 1000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.solar_kw, 150.0 * 0.4 * 220.0 / 1000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.lighting_kw, 8.0 * 1000.0 * 0.7 / 1000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.oa_equipment_kw, 12.0 * 1000.0 * 0.7 / 1000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.person_kw, 3.0, epsilon = 1e-12);

        let sum = s.wall_kw + s.window_kw + s.solar_kw + s.lighting_kw + s.oa_equipment_kw + s.person_kw;
        assert_abs_diff_eq!(s.total_kw, sum, epsilon = 1e-12);
        assert!(s.total_kw > 0.0);
    }

    #[test]
    fn latent_includes_occupants_and_humid_outdoor_air() {
        let calc = HeatLoadCalculator::new(floor());
        let l = calc.latent_load(&july());
        assert_abs_diff_eq!(l.person_kw, 2.0, epsilon = 1e-12);
        assert!(l.outdoor_air_kw > 0.0);
        assert!(l.total_kw >= 2.0);
        assert_abs_diff_eq!(l.total_kw, l.person_kw + l.outdoor_air_kw, epsilon = 1e-12);
    }

    #[test]
    fn dry_outdoor_air_gives_no_latent_credit() {
        let calc = HeatLoadCalculator::new(floor());
        let winter = MonthlyCondition {
            month: 1,
            outdoor_temp: 5.2,
            outdoor_humidity: 52.0,
            indoor_temp_setpoint: 22.0,
            indoor_humidity_setpoint: 45.0,
            supply_air_temp: 20.0,
            occupancy: 50,
            occupancy_rate: 0.85,
            operation_hours: 200.0,
        };
        let l = calc.latent_load(&winter);
        assert_eq!(l.outdoor_air_kw, 0.0);
        assert_abs_diff_eq!(l.total_kw, 2.0, epsilon = 1e-12);

        let s = calc.sensible_load(&winter, &equipment());
        assert!(s.wall_kw < 0.0 && s.window_kw < 0.0);
    }

    #[test]
    fn empty_floor_has_only_occupant_gains() {
        let calc = HeatLoadCalculator::new(floor());
        let mut c = july();
        c.occupancy_rate = 0.0;
        let s = calc.sensible_load(&c, &equipment());
        assert_eq!(s.lighting_kw, 0.0);
        assert_eq!(s.oa_equipment_kw, 0.0);
    }
}
