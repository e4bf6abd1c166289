//! Monthly building energy balance.

/// Simulation orchestration over a sequence of months.
pub mod engine;
/// Sensible and latent heat loads.
pub mod heat_load;
/// HVAC plant energy.
pub mod hvac;
/// Moist-air properties.
pub mod psychrometrics;
pub mod summary;
pub mod types;

pub use engine::{BuildingEnergyModel, simulate_year};
pub use summary::AnnualSummary;
pub use types::{EquipmentSpec, FloorSpec, MonthlyCondition, MonthlyResult};
