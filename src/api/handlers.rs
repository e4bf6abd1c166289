//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{
    CalibrateRequest, CompareRequest, ErrorResponse, HealthResponse, PresetInfo, SimulateResponse,
};
use crate::calibration::{
    self, CalibrationMethod, CalibrationOptions, CalibrationOutcome, CancellationToken, Comparison,
};
use crate::config::{BuildingConfig, ConfigError};
use crate::error::CalibrationError;
use crate::model::{AnnualSummary, BuildingEnergyModel};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn check_config(config: &BuildingConfig) -> Result<(), ApiError> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors.iter().map(ConfigError::to_string).collect();
    Err(error(StatusCode::BAD_REQUEST, messages.join("; ")))
}

/// `GET /health` → 200
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /presets` → 200 + `Vec<PresetInfo>`
pub async fn list_presets() -> Json<Vec<PresetInfo>> {
    let presets = BuildingConfig::PRESETS
        .iter()
        .filter_map(|name| BuildingConfig::from_preset(name).ok())
        .map(|cfg| PresetInfo {
            name: cfg.name,
            description: cfg.description,
        })
        .collect();
    Json(presets)
}

/// `GET /presets/{name}` → 200 + `BuildingConfig`, or 404
pub async fn get_preset(Path(name): Path<String>) -> Result<Json<BuildingConfig>, ApiError> {
    BuildingConfig::from_preset(&name)
        .map(Json)
        .map_err(|e| error(StatusCode::NOT_FOUND, e.to_string()))
}

/// `POST /simulate` → 200 + `SimulateResponse`, or 400 on invalid input
pub async fn simulate(Json(config): Json<BuildingConfig>) -> Result<Json<SimulateResponse>, ApiError> {
    check_config(&config)?;
    let results = BuildingEnergyModel::from_config(&config).simulate_year();
    let summary = AnnualSummary::from_results(&results);
    Ok(Json(SimulateResponse { results, summary }))
}

/// `POST /compare` → 200 + `Comparison`, or 400
pub async fn compare(Json(req): Json<CompareRequest>) -> Result<Json<Comparison>, ApiError> {
    check_config(&req.config)?;
    calibration::compare(&req.config, &req.actual_data, req.comparison_target)
        .map(Json)
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))
}

/// `POST /calibrate` → 200 + `CalibrationOutcome`, or 400 on an unknown
/// method or invalid request
pub async fn calibrate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CalibrateRequest>,
) -> Result<Json<CalibrationOutcome>, ApiError> {
    let method: CalibrationMethod = req
        .method
        .parse()
        .map_err(|e: CalibrationError| error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let request = req.request;
    check_config(&BuildingConfig {
        name: String::new(),
        description: String::new(),
        floor_spec: request.floor_spec.clone(),
        equipment_spec: request.equipment_spec.clone(),
        monthly_conditions: request.monthly_conditions.clone(),
    })?;

    let defaults = &state.options;
    let options = CalibrationOptions {
        seed: req.seed.unwrap_or(defaults.seed),
        max_iterations: req.max_iterations.unwrap_or(defaults.max_iterations),
        max_combinations: req.max_combinations.unwrap_or(defaults.max_combinations),
        ..defaults.clone()
    };

    // dropping the handler future (client gone) stops the search at the next boundary
    let cancel = CancellationToken::new();
    let _guard = cancel.drop_guard();
    let outcome = tokio::task::spawn_blocking(move || {
        calibration::calibrate(&request, method, &options, Some(&cancel))
    })
    .await
    .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    outcome
        .map(Json)
        .map_err(|e| error(StatusCode::BAD_REQUEST, e.to_string()))
}
