// ============================================================================
// Messages Routes
// ============================================================================
//
// Endpoints:
// - POST /api/v1/create - Store and publish a message
// - GET /api/v1/messages - List all messages
// - GET /api/v1/messages/stats - Count of processed messages
// - GET /api/v1/messages/:id - Fetch one message
// - PUT /api/v1/messages/:id/process - Mark a message as processed
//
// ============================================================================

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use courier_config::MAX_MESSAGE_SIZE;
use courier_error::AppError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::context::AppContext;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub message: String,
}

fn validate_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::validation("message must not be empty"));
    }
    if content.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::validation(format!(
            "message exceeds {} bytes",
            MAX_MESSAGE_SIZE
        )));
    }
    // Postgres text columns cannot hold NUL
    if content.contains('\0') {
        return Err(AppError::validation("message must not contain NUL characters"));
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("invalid message id '{}'", raw)))
}

/// POST /api/v1/create
pub async fn create_message(
    State(app_context): State<Arc<AppContext>>,
    body: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = body.map_err(|e| AppError::validation(e.body_text()))?;
    validate_content(&request.message)?;

    let id = app_context.service.create_message(&request.message).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// GET /api/v1/messages
pub async fn list_messages(
    State(app_context): State<Arc<AppContext>>,
) -> Result<impl IntoResponse, AppError> {
    let messages = app_context.service.list_messages().await?;
    Ok(Json(messages))
}

/// GET /api/v1/messages/:id
pub async fn get_message(
    State(app_context): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let message = app_context.service.get_message_by_id(id).await?;
    Ok(Json(message))
}

/// GET /api/v1/messages/stats
pub async fn get_processed_stats(
    State(app_context): State<Arc<AppContext>>,
) -> Result<impl IntoResponse, AppError> {
    let processed = app_context.service.get_processed_stats().await?;
    Ok(Json(json!({ "processed_messages": processed })))
}

/// PUT /api/v1/messages/:id/process
///
/// Succeeds for already processed messages too; `processed_now` tells the
/// two cases apart.
pub async fn mark_message_as_processed(
    State(app_context): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let processed_now = app_context.service.mark_message_as_processed(id).await?;

    Ok(Json(json!({
        "message": "Message successfully marked as processed",
        "processed_now": processed_now,
    })))
}
