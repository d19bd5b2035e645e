use crate::api::schemas::health::HealthResponse;
use axum::{Json, response::IntoResponse};
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const SERVICE: &str = "steeple-push";

/// Liveness probe and caller-facing health check.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE.to_string(),
        timestamp: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
    })
}

/// Service descriptor listing the available endpoints.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /api/notifications/send",
            "POST /api/notifications/broadcast",
            "POST /api/notifications/token",
            "GET /api/health",
        ]
    }))
}
