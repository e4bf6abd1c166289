//! Annual simulation that orchestrates heat loads, HVAC plant, and psychrometrics.

use crate::config::BuildingConfig;

use super::heat_load::{HeatLoadCalculator, solar_radiation};
use super::hvac::HvacSystemModel;
use super::psychrometrics::enthalpy_at;
use super::types::{EquipmentSpec, FloorSpec, MonthlyCondition, MonthlyResult};

/// Building energy model owning its specifications and monthly conditions.
///
/// Specifications are moved in at construction, so later changes to the
/// caller's copies are never observed. Simulation borrows `&self` and has no
/// side effects; identical models always produce identical results.
#[derive(Debug, Clone)]
pub struct BuildingEnergyModel {
    heat_loads: HeatLoadCalculator,
    hvac: HvacSystemModel,
    monthly_conditions: Vec<MonthlyCondition>,
}

impl BuildingEnergyModel {
    /// Creates a new model.
    ///
    /// # Arguments
    ///
    /// * `floor` - Envelope specification
    /// * `equipment` - Internal gains and HVAC plant specification
    /// * `monthly_conditions` - Conditions in simulation order
    pub fn new(
        floor: FloorSpec,
        equipment: EquipmentSpec,
        monthly_conditions: Vec<MonthlyCondition>,
    ) -> Self {
        Self {
            heat_loads: HeatLoadCalculator::new(floor),
            hvac: HvacSystemModel::new(equipment),
            monthly_conditions,
        }
    }

    /// Creates a model from a persisted configuration document.
    pub fn from_config(config: &BuildingConfig) -> Self {
        Self::new(
            config.floor_spec.clone(),
            config.equipment_spec.clone(),
            config.monthly_conditions.clone(),
        )
    }

    /// Returns the model inputs as a configuration document.
    pub fn to_config(&self, name: &str, description: &str) -> BuildingConfig {
        BuildingConfig {
            name: name.to_string(),
            description: description.to_string(),
            floor_spec: self.floor().clone(),
            equipment_spec: self.equipment().clone(),
            monthly_conditions: self.monthly_conditions.clone(),
        }
    }

    pub fn floor(&self) -> &FloorSpec {
        self.heat_loads.floor()
    }

    pub fn equipment(&self) -> &EquipmentSpec {
        self.hvac.equipment()
    }

    pub fn monthly_conditions(&self) -> &[MonthlyCondition] {
        &self.monthly_conditions
    }

    /// Simulates one month and returns its result row.
    pub fn simulate_month(&self, condition: &MonthlyCondition) -> MonthlyResult {
        let floor = self.floor();
        let equipment = self.equipment();

        // 1. Loads
        let sensible = self.heat_loads.sensible_load(condition, equipment);
        let latent = self.heat_loads.latent_load(condition);
        let total_load_kw = sensible.total_kw + latent.total_kw;

        // 2. Plant energy
        let central = self.hvac.central_energy(sensible.total_kw, latent.total_kw, condition);
        let local = self.hvac.local_energy(sensible.total_kw, latent.total_kw, condition);

        // 3. Internal gains energy
        let in_use_area_h = floor.floor_area * condition.occupancy_rate * condition.operation_hours;
        let lighting_kwh = equipment.lighting_power_density * in_use_area_h / 1000.0;
        let oa_equipment_kwh = equipment.oa_equipment_power_density * in_use_area_h / 1000.0;

        // 4. Air state points
        let outdoor_enthalpy = enthalpy_at(condition.outdoor_temp, condition.outdoor_humidity);
        let indoor_enthalpy =
            enthalpy_at(condition.indoor_temp_setpoint, condition.indoor_humidity_setpoint);

        let shf = if total_load_kw != 0.0 {
            sensible.total_kw / total_load_kw
        } else {
            0.0
        };

        MonthlyResult {
            month: condition.month,
            outdoor_temp: condition.outdoor_temp,
            outdoor_humidity: condition.outdoor_humidity,
            indoor_temp: condition.indoor_temp_setpoint,
            indoor_humidity: condition.indoor_humidity_setpoint,
            supply_air_temp: condition.supply_air_temp,
            occupancy: condition.occupancy,
            occupancy_rate: condition.occupancy_rate,
            operation_hours: condition.operation_hours,
            solar_radiation: solar_radiation(condition.month),
            load_wall_kw: sensible.wall_kw,
            load_window_kw: sensible.window_kw,
            load_solar_kw: sensible.solar_kw,
            load_lighting_kw: sensible.lighting_kw,
            load_oa_equipment_kw: sensible.oa_equipment_kw,
            load_person_sensible_kw: sensible.person_kw,
            load_person_latent_kw: latent.person_kw,
            load_outdoor_air_latent_kw: latent.outdoor_air_kw,
            sensible_load_kw: sensible.total_kw,
            latent_load_kw: latent.total_kw,
            total_load_kw,
            shf,
            central_ahu_fan_kwh: central.ahu_fan_kwh,
            central_chiller_kwh: central.chiller_kwh,
            central_total_kwh: central.total_kwh,
            local_fan_kwh: local.fan_kwh,
            local_compressor_kwh: local.compressor_kwh,
            local_total_kwh: local.total_kwh,
            lighting_kwh,
            oa_equipment_kwh,
            outdoor_enthalpy,
            indoor_enthalpy,
        }
    }

    /// Simulates every condition in input order.
    pub fn simulate_year(&self) -> Vec<MonthlyResult> {
        self.monthly_conditions
            .iter()
            .map(|c| self.simulate_month(c))
            .collect()
    }
}

/// Simulates a year from borrowed inputs.
///
/// Convenience wrapper that clones the inputs into a [`BuildingEnergyModel`].
pub fn simulate_year(
    floor: &FloorSpec,
    equipment: &EquipmentSpec,
    monthly_conditions: &[MonthlyCondition],
) -> Vec<MonthlyResult> {
    BuildingEnergyModel::new(floor.clone(), equipment.clone(), monthly_conditions.to_vec())
        .simulate_year()
}
