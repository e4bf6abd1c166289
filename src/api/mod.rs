//! REST API over simulation, comparison, and calibration.
//!
//! - `GET /health` - liveness probe
//! - `GET /presets` - preset names and descriptions
//! - `GET /presets/{name}` - a full preset configuration
//! - `POST /simulate` - monthly results and annual summary for a configuration
//! - `POST /compare` - metrics of a configuration against metered data
//! - `POST /calibrate` - ranked calibration results

mod handlers;
pub mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::calibration::CalibrationOptions;

/// Immutable application state shared across all request handlers.
pub struct AppState {
    /// Search defaults; a request may override seed and limits.
    pub options: CalibrationOptions,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/presets", get(handlers::list_presets))
        .route("/presets/{name}", get(handlers::get_preset))
        .route("/simulate", post(handlers::simulate))
        .route("/compare", post(handlers::compare))
        .route("/calibrate", post(handlers::calibrate))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
