//! Monthly HVAC energy model for office buildings, with calibration of
//! uncertain specification parameters against metered energy data.

#[cfg(feature = "api")]
pub mod api;
/// Parameter search against metered data.
pub mod calibration;
pub mod config;
pub mod error;
pub mod io;
/// Psychrometrics, heat loads, HVAC energy, and the annual simulation.
pub mod model;
pub mod telemetry;
