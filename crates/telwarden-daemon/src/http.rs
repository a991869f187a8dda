//! HTTP boundary for the Telwarden daemon using axum.
//!
//! `POST /telemetry` accepts one telemetry event and reports the detection
//! outcome. Shape violations (missing fields, wrong types, negative sizes)
//! are rejected by the `Json` extractor with 422 before any state mutates.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use telwarden_core::ingest::TelemetryService;
use telwarden_core::telemetry::{TelemetryRecord, TelemetryResponse};
use telwarden_core::WardenError;

#[derive(Clone)]
struct AppState {
    service: Arc<TelemetryService>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    tracked_devices: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Build the daemon router around an ingest service.
pub fn router(service: Arc<TelemetryService>) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/telemetry", post(telemetry_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .with_state(state)
}

async fn telemetry_handler(
    State(state): State<AppState>,
    Json(record): Json<TelemetryRecord>,
) -> Result<Json<TelemetryResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.service.handle(&record, Utc::now()).await {
        Ok(status) => Ok(Json(TelemetryResponse { status })),
        Err(e @ WardenError::InvalidTelemetry(_)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
        Err(e) => {
            error!(error = %e, "telemetry handling failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        tracked_devices: state.service.tracked_devices().await,
    })
}
