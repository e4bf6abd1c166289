//! Conversion of monthly thermal loads into HVAC electricity use.

use super::types::{CentralEnergy, EquipmentSpec, LocalEnergy, MonthlyCondition};

/// Electricity needed to meet `load_kw` for `hours` at the given COP (kWh).
///
/// Heating and cooling share one COP: the load magnitude is used regardless
/// of sign.
pub fn thermal_energy_kwh(load_kw: f64, hours: f64, cop: f64) -> f64 {
    load_kw.abs() * hours / cop
}

/// HVAC plant model bound to one equipment specification.
#[derive(Debug, Clone)]
pub struct HvacSystemModel {
    equipment: EquipmentSpec,
}

impl HvacSystemModel {
    /// Creates a plant model for the given equipment.
    pub fn new(equipment: EquipmentSpec) -> Self {
        Self { equipment }
    }

    /// Returns the equipment specification this model was built with.
    pub fn equipment(&self) -> &EquipmentSpec {
        &self.equipment
    }

    /// Central system energy: air-handling fan plus chiller.
    pub fn central_energy(
        &self,
        sensible_kw: f64,
        latent_kw: f64,
        condition: &MonthlyCondition,
    ) -> CentralEnergy {
        let hours = condition.operation_hours;
        let ahu_fan_kwh = self.equipment.central_ahu_fan_power * hours;
        let chiller_kwh =
            thermal_energy_kwh(sensible_kw + latent_kw, hours, self.equipment.central_chiller_cop);
        CentralEnergy {
            ahu_fan_kwh,
            chiller_kwh,
            total_kwh: ahu_fan_kwh + chiller_kwh,
        }
    }

    /// Local system energy: unit fan plus compressor.
    pub fn local_energy(
        &self,
        sensible_kw: f64,
        latent_kw: f64,
        condition: &MonthlyCondition,
    ) -> LocalEnergy {
        let hours = condition.operation_hours;
        let fan_kwh = self.equipment.local_ac_fan_power * hours;
        let compressor_kwh =
            thermal_energy_kwh(sensible_kw + latent_kw, hours, self.equipment.local_ac_cop);
        LocalEnergy {
            fan_kwh,
            compressor_kwh,
            total_kwh: fan_kwh + compressor_kwh,
        }
    }
}
