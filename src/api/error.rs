use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::DbError;
use crate::llm::LlmError;
use crate::storage::{ArchiveError, StorageError};
use crate::upstream::UpstreamError;

/// API error codes for client handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    BadGateway,
    DatabaseError,
    InternalError,
    ValidationError,
}

/// Standard API error response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Wrapper for API results
pub type ApiResult<T> = Result<T, AppError>;

/// Application error that converts to HTTP responses
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ApiError,
}

impl AppError {
    pub fn new(status: StatusCode, body: ApiError) -> Self {
        Self { status, body }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new(ErrorCode::NotFound, message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(ErrorCode::BadRequest, message))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiError::new(ErrorCode::Unauthorized, message))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiError::new(ErrorCode::Forbidden, message))
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, ApiError::new(ErrorCode::BadGateway, message))
    }

    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new(ErrorCode::DatabaseError, err.to_string()),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new(ErrorCode::InternalError, message),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new(ErrorCode::ValidationError, message))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.body.error, self.status)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound(msg) => Self::not_found(format!("{} not found", msg)),
            DbError::Validation(msg) => Self::validation(msg.clone()),
            _ => Self::database(err),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => Self::not_found(format!("File not found: {}", path)),
            StorageError::Archive(ArchiveError::Empty) => {
                Self::bad_request("At least one of frontend or backend code must be provided")
            }
            other => {
                tracing::error!("Storage error: {}", other);
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized(message) => Self::unauthorized(message),
            other => {
                tracing::error!("Upstream request failed: {}", other);
                Self::bad_gateway(other.to_string())
            }
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::UnknownModel(_) => Self::bad_request(err.to_string()),
            other => {
                tracing::error!("Model request failed: {}", other);
                Self::bad_gateway(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let body = serde_json::to_value(ApiError::new(ErrorCode::BadGateway, "down")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "down");
        assert_eq!(body["code"], "BAD_GATEWAY");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn library_errors_map_to_statuses() {
        let err: AppError = LlmError::UnknownModel("x".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "Model configuration not found for model: x");

        let err: AppError = StorageError::NotFound("users/u/a.zip".into()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: AppError = UpstreamError::Unauthorized("expired".into()).into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.body.code, ErrorCode::Unauthorized);

        let err: AppError = UpstreamError::Status {
            url: "http://idem/projects/p".into(),
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn display_carries_message_and_status() {
        let err = AppError::bad_gateway("project API unreachable");
        assert_eq!(err.to_string(), "project API unreachable (502 Bad Gateway)");
    }
}
