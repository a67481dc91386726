/// Unified error types for the Trustimonials service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors (ownership mismatch)
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Single-message validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation errors from request DTOs
    #[error("Request validation failed")]
    Invalid(#[from] validator::ValidationErrors),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate slug)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Expired or exhausted resource (e.g., request link past its limits)
    #[error("Gone: {0}")]
    Gone(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// One field-level validation failure
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {}", field)),
            })
        })
        .collect()
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, errors) = match &self {
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
                None,
            ),
            ApiError::Authorization(_) => {
                (StatusCode::FORBIDDEN, "Forbidden", self.to_string(), None)
            }
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
                None,
            ),
            ApiError::Invalid(e) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                "Validation failed".to_string(),
                Some(field_errors(e)),
            ),
            ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "NotFound", self.to_string(), None)
            }
            ApiError::Conflict(_) => {
                (StatusCode::CONFLICT, "Conflict", self.to_string(), None)
            }
            ApiError::Gone(_) => (StatusCode::GONE, "Gone", self.to_string(), None),
            ApiError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
                None,
            ),
            ApiError::Database(_) | ApiError::Internal(_) | ApiError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
                None,
            ),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            errors,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;
