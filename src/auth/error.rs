// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::{debug, error, warn};

use crate::auth::models::Role;
use crate::store::StoreError;
use crate::validation::field_errors;

/// Authentication and authorization error types
#[derive(Debug)]
pub enum AuthError {
    // Authentication errors
    ValidationError(validator::ValidationErrors),
    InvalidCredentials,
    /// Authorization header absent or not of the form `Bearer <token>`
    MissingToken,
    /// Bad signature, wrong issuer, malformed or expired
    InvalidToken,
    MissingRefreshToken,
    InvalidRefreshToken,
    UsernameTaken,
    IncorrectPassword,
    PasswordUnchanged,
    UserNotFound,
    DatabaseError(String),
    PasswordHashError,
    TokenGenerationError(String),

    // Authorization errors
    /// No identity attached to the request
    Unauthenticated,
    /// The identity's role is not in the allowed set
    InsufficientPermissions {
        allowed: &'static [Role],
        actual: Role,
    },
    ConfigError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ValidationError(errors) => write!(f, "Validation error: {}", errors),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingToken => write!(f, "Missing or malformed Authorization header"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::MissingRefreshToken => write!(f, "Missing refresh token"),
            AuthError::InvalidRefreshToken => write!(f, "Invalid refresh token"),
            AuthError::UsernameTaken => write!(f, "Username already taken"),
            AuthError::IncorrectPassword => write!(f, "Current password is incorrect"),
            AuthError::PasswordUnchanged => {
                write!(f, "New password must be different from current password")
            }
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::Unauthenticated => write!(f, "Unauthenticated"),
            AuthError::InsufficientPermissions { allowed, actual } => {
                let allowed: Vec<&str> = allowed.iter().map(Role::as_str).collect();
                write!(
                    f,
                    "Insufficient permissions: allowed roles [{}], but user has role '{}'",
                    allowed.join(", "),
                    actual
                )
            }
            AuthError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            AuthError::ValidationError(errors) => {
                debug!("Auth validation error: {:?}", errors);
                json!({
                    "error": {
                        "message": "Request validation failed",
                        "fields": field_errors(errors),
                    }
                })
            }
            AuthError::InvalidCredentials => {
                warn!("Failed login attempt");
                json!({ "error": self.error_message() })
            }
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::Unauthenticated => {
                warn!("Rejected request: {}", self);
                json!({ "error": self.error_message() })
            }
            AuthError::MissingRefreshToken | AuthError::InvalidRefreshToken => {
                warn!("Rejected refresh: {}", self);
                json!({ "error": self.error_message() })
            }
            AuthError::InsufficientPermissions { .. } => {
                warn!("Authorization failed: {}", self);
                json!({ "error": self.error_message() })
            }
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::ConfigError(_) => {
                error!("Auth internal error: {}", self);
                json!({ "error": self.error_message() })
            }
            _ => {
                debug!("Auth request rejected: {}", self);
                json!({ "error": self.error_message() })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::UsernameTaken => StatusCode::CONFLICT,
            AuthError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            AuthError::PasswordUnchanged => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(_) => "Request validation failed".to_string(),
            AuthError::InsufficientPermissions { .. } => "Forbidden".to_string(),
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::ConfigError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors)
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::DatabaseError(error.to_string())
    }
}
