//! Liveness, readiness and metrics

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bhada_telemetry::HealthStatus;

use super::AppState;

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::new())
}

pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let mut status = HealthStatus::new();
    match state.storage.check().await {
        Ok(()) => status.add_check(state.storage.backend(), true, None),
        Err(e) => status.add_check(state.storage.backend(), false, Some(e.code().to_string())),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
