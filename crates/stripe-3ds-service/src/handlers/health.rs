//! Health check handlers.

use axum::Json;
use serde::Serialize;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "stripe-3ds-backend";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}
