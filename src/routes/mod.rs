// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Router assembly and middleware
// - health.rs: Liveness, readiness and metrics endpoints
// - messages.rs: Message lifecycle endpoints under /api/v1
//
// ============================================================================

mod health;
mod messages;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Create the application router
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health and monitoring
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        // Message lifecycle
        .route("/api/v1/create", post(messages::create_message))
        .route("/api/v1/messages", get(messages::list_messages))
        .route("/api/v1/messages/stats", get(messages::get_processed_stats))
        .route("/api/v1/messages/:id", get(messages::get_message))
        .route(
            "/api/v1/messages/:id/process",
            put(messages::mark_message_as_processed),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(app_context)
}
