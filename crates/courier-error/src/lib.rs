use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

mod domain;

pub use domain::{PublishError, ServiceError, StoreError};

/// Error type returned by HTTP handlers
///
/// Wraps [`ServiceError`] and adds the request-level failures (validation,
/// malformed ids) that never reach the message service.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Request Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    // ===== Message Service Errors =====
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::MessageNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message (without storage or broker details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation error: {}", msg),
            AppError::Service(err) => match err {
                ServiceError::CannotCreateMessage(_) => "Failed to create message".to_string(),
                ServiceError::CannotProduceMessage { .. } => {
                    "Message stored but could not be published".to_string()
                }
                ServiceError::MessageNotFound(id) => format!("Message {} not found", id),
                ServiceError::CannotGetMessage(_) => "Failed to get message".to_string(),
                ServiceError::CannotUpdateMessage(_) => "Failed to update message".to_string(),
            },
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Service(err) => match err {
                ServiceError::CannotCreateMessage(_) => "CANNOT_CREATE_MESSAGE",
                ServiceError::CannotProduceMessage { .. } => "CANNOT_PRODUCE_MESSAGE",
                ServiceError::MessageNotFound(_) => "MESSAGE_NOT_FOUND",
                ServiceError::CannotGetMessage(_) => "CANNOT_GET_MESSAGE",
                ServiceError::CannotUpdateMessage(_) => "CANNOT_UPDATE_MESSAGE",
            },
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            // Include the source chain; Display on service errors is terse
            tracing::error!(
                error = ?self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }

    fn response_body(&self) -> serde_json::Value {
        let mut body = json!({
            "error": self.user_message(),
            "error_code": self.error_code(),
            "status": self.status_code().as_u16(),
        });

        // The row exists, so the caller gets its id back
        if let AppError::Service(ServiceError::CannotProduceMessage { id, .. }) = self {
            body["id"] = json!(id);
        }

        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();

        let status = self.status_code();
        (status, axum::Json(self.response_body())).into_response()
    }
}

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_service_errors_map_to_status_and_code() {
        let id = Uuid::new_v4();

        let not_found = AppError::from(ServiceError::MessageNotFound(id));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.error_code(), "MESSAGE_NOT_FOUND");

        let create = AppError::from(ServiceError::CannotCreateMessage(StoreError::Storage(
            sqlx::Error::PoolTimedOut,
        )));
        assert_eq!(create.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(create.error_code(), "CANNOT_CREATE_MESSAGE");

        let produce = AppError::from(ServiceError::CannotProduceMessage {
            id,
            source: PublishError::Rejected("broker down".into()),
        });
        assert_eq!(produce.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(produce.error_code(), "CANNOT_PRODUCE_MESSAGE");
    }

    #[test]
    fn test_produce_failure_body_carries_id() {
        let id = Uuid::new_v4();
        let err = AppError::from(ServiceError::CannotProduceMessage {
            id,
            source: PublishError::Timeout(Duration::from_millis(5000)),
        });

        let body = err.response_body();
        assert_eq!(body["id"], id.to_string());
        assert_eq!(body["error_code"], "CANNOT_PRODUCE_MESSAGE");
        assert_eq!(body["status"], 500);
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = AppError::from(ServiceError::CannotGetMessage(StoreError::Storage(
            sqlx::Error::Protocol("password authentication failed".into()),
        )));
        let body = err.response_body();
        assert_eq!(body["error"], "Failed to get message");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn test_validation_message_is_exposed() {
        let err = AppError::validation("message must not be empty");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.response_body()["error"],
            "Validation error: message must not be empty"
        );
    }
}
