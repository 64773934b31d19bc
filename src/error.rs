// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{AuthError, PasswordError, TokenError};
use crate::database::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            response["field_errors"] = json!(field_errors);
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure attributed to a single field
    pub fn field_error(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ApiError::validation_error(message, Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => ApiError::conflict("Identifier already registered"),
            StoreError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            StoreError::InvalidReference(column) => {
                let message = format!("Unknown {}", column.trim_end_matches("_id"));
                ApiError::field_error(&column, message)
            }
            StoreError::Sqlx(sqlx_err) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => ApiError::unauthorized("No token provided"),
            TokenError::Expired => ApiError::forbidden("Token expired"),
            TokenError::Invalid(_) => ApiError::forbidden("Invalid token"),
            TokenError::Signing(msg) => {
                tracing::error!("Token signing failed: {}", msg);
                ApiError::internal_server_error("Failed to issue token")
            }
            TokenError::InvalidSecret => {
                tracing::error!("Token secret not configured");
                ApiError::internal_server_error("Failed to issue token")
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::DuplicateIdentifier(_) => ApiError::conflict("Identifier already registered"),
            AuthError::NotFound => ApiError::not_found("Account not found"),
            AuthError::Validation { field, message } => ApiError::field_error(field, message),
            AuthError::Store(e) => e.into(),
            AuthError::Token(e) => e.into(),
            AuthError::Password(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_split_401_and_403() {
        assert_eq!(ApiError::from(TokenError::Missing).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(TokenError::Expired).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(TokenError::Invalid("bad signature".into())).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ApiError::from(StoreError::Sqlx(sqlx::Error::ColumnNotFound("password_hash".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("password_hash"));

        let err = ApiError::from(StoreError::PoolExhausted);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unknown_reference_is_a_field_error() {
        let err = ApiError::from(StoreError::InvalidReference("department_id".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_json()["field_errors"]["department_id"], "Unknown department");
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(ApiError::from(AuthError::InvalidCredentials).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::DuplicateIdentifier("S001".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::from(AuthError::NotFound).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_body_names_the_field() {
        let err = ApiError::from(AuthError::Validation {
            field: "password",
            message: "Password must be at least 8 characters".into(),
        });
        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["password"], "Password must be at least 8 characters");
    }
}
