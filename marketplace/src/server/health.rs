//! Health endpoints for orchestration probes.

use axum::Json;
use serde::Serialize;

/// Health response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
}

/// Liveness probe.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Readiness probe.
pub async fn readiness_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ready" })
}
