// Error handling module for the Cultural Events API
// Provides centralized error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::auth::error::AuthError;
use crate::store::StoreError;
use crate::validation::field_errors;

/// Main error type for the resource handlers
/// All handlers outside the auth module return Result<T, ApiError>
///
/// Each variant maps to a specific HTTP status code. Every body has the
/// shape `{"error": <string | object>}`.
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Malformed query string or other rejected input without field detail
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound {
        resource: String,
        id: String,
    },

    /// Duplicate resource conflict
    /// Maps to HTTP 409 Conflict
    Conflict {
        message: String,
    },

    /// Database operation errors
    /// Maps to HTTP 500 Internal Server Error
    /// Sensitive details are filtered from client responses
    DatabaseError(sqlx::Error),

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    InternalError(String),

    /// Authorization failures raised by a handler
    /// Maps to HTTP 403 Forbidden
    Forbidden(String),

    /// Failures from the auth pipeline keep their own status and message
    Auth(AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Auth(auth_error) = self {
            return auth_error.into_response();
        }
        let (status, body) = self.to_error_response();
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    /// Shorthand for `NotFound`
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Convert ApiError to HTTP status code and JSON body
    ///
    /// Logging levels follow severity:
    /// - error!: internal errors and database errors (500-level)
    /// - warn!: conflicts and forbidden attempts
    /// - debug!: expected client errors (validation, not found)
    fn to_error_response(&self) -> (StatusCode, Value) {
        let status = self.status_code();
        let body = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                json!({
                    "error": {
                        "message": "Request validation failed",
                        "fields": field_errors(errors),
                    }
                })
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                json!({ "error": message })
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                json!({ "error": format!("{} not found", resource) })
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                json!({ "error": message })
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                json!({ "error": "Internal server error" })
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                json!({ "error": "Internal server error" })
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                json!({ "error": message })
            }
            ApiError::Auth(auth_error) => json!({ "error": auth_error.error_message() }),
        };
        (status, body)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Auth(auth_error) => auth_error.status_code(),
        }
    }
}

/// Convert sqlx errors to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

/// Convert store errors to ApiError
impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(message) => ApiError::Conflict { message },
            StoreError::Database(db_error) => ApiError::DatabaseError(db_error),
        }
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Auth(error)
    }
}
