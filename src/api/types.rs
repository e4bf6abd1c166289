//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::calibration::{ActualDataPoint, CalibrationRequest, ComparisonTarget};
use crate::config::BuildingConfig;
use crate::model::{AnnualSummary, MonthlyResult};

/// Error body returned with every 4xx/5xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// One entry of `GET /presets`.
#[derive(Debug, Serialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub results: Vec<MonthlyResult>,
    pub summary: AnnualSummary,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub config: BuildingConfig,
    pub actual_data: Vec<ActualDataPoint>,
    #[serde(default)]
    pub comparison_target: ComparisonTarget,
}

/// `POST /calibrate` body: the calibration inputs plus method and limits.
///
/// `method` stays a string so an unknown method is reported as a 400 with
/// the offending value.
#[derive(Debug, Deserialize)]
pub struct CalibrateRequest {
    #[serde(flatten)]
    pub request: CalibrationRequest,
    #[serde(default = "default_method")]
    pub method: String,
    pub seed: Option<u64>,
    pub max_iterations: Option<usize>,
    pub max_combinations: Option<usize>,
}

fn default_method() -> String {
    "grid".to_string()
}
