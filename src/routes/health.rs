// ============================================================================
// Health and Metrics Routes
// ============================================================================
//
// Endpoints:
// - GET /health - Liveness and service identity
// - GET /health/ready - Readiness (message store reachable)
// - GET /metrics - Prometheus metrics
//
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::context::AppContext;
use crate::metrics;

/// GET /health
pub async fn health_check(State(app_context): State<Arc<AppContext>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": app_context.config.app_name,
            "version": app_context.config.app_version,
        })),
    )
}

/// GET /health/ready
pub async fn readiness_check(State(app_context): State<Arc<AppContext>>) -> impl IntoResponse {
    match app_context.service.check_store().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ready"}))),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable"})),
            )
        }
    }
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    match metrics::gather_metrics() {
        Ok(metrics_data) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
            metrics_data,
        ),
        Err(e) => {
            tracing::error!("Failed to gather metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("Content-Type", "text/plain")],
                "Internal Server Error".to_string(),
            )
        }
    }
}
