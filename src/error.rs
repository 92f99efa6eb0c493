use std::any::Any;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::middleware::current_request_id;
use crate::services::email::MailError;
use crate::services::image_host::ImageHostError;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Error codes for categorizing errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    #[serde(rename = "AUTH_1001")]
    InvalidCredentials,
    #[serde(rename = "AUTH_1002")]
    TokenExpired,
    #[serde(rename = "AUTH_1003")]
    TokenInvalid,
    #[serde(rename = "AUTH_1004")]
    TokenMissing,
    #[serde(rename = "AUTH_1008")]
    UnknownAccount,
    #[serde(rename = "AUTH_1009")]
    ActivationExpired,
    #[serde(rename = "AUTH_1010")]
    ActivationInvalid,

    // Authorization errors (2xxx)
    #[serde(rename = "AUTHZ_2003")]
    RoleNotAuthorized,

    // Validation errors (3xxx)
    #[serde(rename = "VAL_3001")]
    InvalidInput,
    #[serde(rename = "VAL_3002")]
    MissingRequiredField,
    #[serde(rename = "VAL_3003")]
    InvalidFormat,
    #[serde(rename = "VAL_3009")]
    PasswordMismatch,

    // Resource errors (4xxx)
    #[serde(rename = "RES_4001")]
    NotFound,
    #[serde(rename = "RES_4002")]
    AlreadyExists,

    // Database errors (7xxx)
    #[serde(rename = "DB_7002")]
    QueryFailed,

    // External service errors (8xxx)
    #[serde(rename = "EXT_8004")]
    EmailServiceFailed,
    #[serde(rename = "EXT_8006")]
    ImageHostFailed,

    // Internal errors (9xxx)
    #[serde(rename = "INT_9999")]
    InternalServerError,
}

impl ErrorCode {
    /// Get numeric code
    pub fn code(&self) -> u16 {
        match self {
            // Authentication
            ErrorCode::InvalidCredentials => 1001,
            ErrorCode::TokenExpired => 1002,
            ErrorCode::TokenInvalid => 1003,
            ErrorCode::TokenMissing => 1004,
            ErrorCode::UnknownAccount => 1008,
            ErrorCode::ActivationExpired => 1009,
            ErrorCode::ActivationInvalid => 1010,

            // Authorization
            ErrorCode::RoleNotAuthorized => 2003,

            // Validation
            ErrorCode::InvalidInput => 3001,
            ErrorCode::MissingRequiredField => 3002,
            ErrorCode::InvalidFormat => 3003,
            ErrorCode::PasswordMismatch => 3009,

            // Resource
            ErrorCode::NotFound => 4001,
            ErrorCode::AlreadyExists => 4002,

            // Database
            ErrorCode::QueryFailed => 7002,

            // External Service
            ErrorCode::EmailServiceFailed => 8004,
            ErrorCode::ImageHostFailed => 8006,

            // Internal
            ErrorCode::InternalServerError => 9999,
        }
    }

    /// Get user-friendly message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Your session has expired. Please log in again",
            ErrorCode::TokenInvalid => "Invalid authentication token",
            ErrorCode::TokenMissing => "Please login to continue",
            ErrorCode::UnknownAccount => "User doesn't exist",
            ErrorCode::ActivationExpired => "Activation link has expired. Please register again",
            ErrorCode::ActivationInvalid => "Invalid activation token",

            ErrorCode::RoleNotAuthorized => "Your role is not authorized for this action",

            ErrorCode::InvalidInput => "Invalid input provided",
            ErrorCode::MissingRequiredField => "Please provide all fields",
            ErrorCode::InvalidFormat => "Invalid format provided",
            ErrorCode::PasswordMismatch => "Passwords do not match!",

            ErrorCode::NotFound => "The requested resource was not found",
            ErrorCode::AlreadyExists => "This resource already exists",

            ErrorCode::QueryFailed => "Database query failed",

            ErrorCode::EmailServiceFailed => "Failed to send email",
            ErrorCode::ImageHostFailed => "Image upload service failed",

            ErrorCode::InternalServerError => "An internal server error occurred",
        }
    }

    /// HTTP status the code is rendered with
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidCredentials
            | ErrorCode::UnknownAccount
            | ErrorCode::ActivationExpired
            | ErrorCode::ActivationInvalid
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::PasswordMismatch
            | ErrorCode::AlreadyExists => StatusCode::BAD_REQUEST,

            ErrorCode::TokenExpired | ErrorCode::TokenInvalid | ErrorCode::TokenMissing => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::RoleNotAuthorized => StatusCode::FORBIDDEN,

            ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::EmailServiceFailed | ErrorCode::ImageHostFailed => StatusCode::BAD_GATEWAY,

            ErrorCode::QueryFailed | ErrorCode::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: ErrorCode,
    pub code_number: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub request_id: String,
    pub timestamp: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Image host error: {0}")]
    ImageHost(#[from] ImageHostError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("{1}")]
    WithCode(ErrorCode, String),

    #[error("{1}")]
    WithCodeAndDetails(ErrorCode, String, String),
}

impl ApiError {
    /// Create error with specific error code
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::WithCode(code, message.into())
    }

    /// Create error with code and additional details
    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        ApiError::WithCodeAndDetails(code, message.into(), details.into())
    }

    /// Helper: Invalid credentials
    pub fn invalid_credentials() -> Self {
        ApiError::with_code(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    /// Helper: Login for an email with no account
    pub fn unknown_account() -> Self {
        ApiError::with_code(ErrorCode::UnknownAccount, "User doesn't exist")
    }

    pub fn missing_fields() -> Self {
        ApiError::with_code(ErrorCode::MissingRequiredField, "Please provide all fields")
    }

    pub fn password_mismatch() -> Self {
        ApiError::with_code(ErrorCode::PasswordMismatch, "Passwords do not match!")
    }

    pub fn activation_expired() -> Self {
        ApiError::with_code(
            ErrorCode::ActivationExpired,
            ErrorCode::ActivationExpired.message(),
        )
    }

    pub fn activation_invalid() -> Self {
        ApiError::with_code(
            ErrorCode::ActivationInvalid,
            ErrorCode::ActivationInvalid.message(),
        )
    }

    /// Helper: Resource not found
    pub fn not_found(resource: &str) -> Self {
        ApiError::with_code(ErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Helper: Resource already exists
    pub fn already_exists(resource: &str) -> Self {
        ApiError::with_code(
            ErrorCode::AlreadyExists,
            format!("{} already exists", resource),
        )
    }

    /// Create general validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError::with_code(ErrorCode::InvalidInput, message)
    }

    /// Get error code
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized(_) => ErrorCode::TokenMissing,
            ApiError::Forbidden(_) => ErrorCode::RoleNotAuthorized,
            ApiError::Validation(_) => ErrorCode::InvalidInput,
            ApiError::Database(_) => ErrorCode::QueryFailed,
            ApiError::ImageHost(_) => ErrorCode::ImageHostFailed,
            ApiError::Mail(_) => ErrorCode::EmailServiceFailed,
            ApiError::Internal(_) => ErrorCode::InternalServerError,
            ApiError::WithCode(code, _) => *code,
            ApiError::WithCodeAndDetails(code, _, _) => *code,
        }
    }

    /// Get status code
    pub fn status_code(&self) -> StatusCode {
        self.error_code().status()
    }

    /// Message shown to the client. Server-side failures never leak their cause.
    fn client_message(&self) -> String {
        match self {
            ApiError::WithCode(_, msg) | ApiError::WithCodeAndDetails(_, msg, _) => msg.clone(),
            ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) | ApiError::Validation(msg) => {
                msg.clone()
            }
            _ => self.error_code().message().to_string(),
        }
    }

    /// Get error details
    fn error_details(&self) -> Option<String> {
        match self {
            ApiError::WithCodeAndDetails(_, _, details) => Some(details.clone()),
            _ => None,
        }
    }

    /// Log error with appropriate level
    fn log_error(&self, request_id: &str) {
        match self.status_code() {
            status if status.is_server_error() => {
                error!(
                    request_id = %request_id,
                    error = %self,
                    "Server error occurred"
                );
            }
            status if status.is_client_error() => {
                warn!(
                    request_id = %request_id,
                    error = %self,
                    "Client error occurred"
                );
            }
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id =
            current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        let status = self.status_code();
        let code = self.error_code();

        self.log_error(&request_id);

        let error_response = ErrorResponse {
            success: false,
            message: self.client_message(),
            code,
            code_number: code.code(),
            details: self.error_details(),
            request_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Axum JSON rejections become structured API errors
impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        match err {
            JsonRejection::JsonDataError(e) => ApiError::with_details(
                ErrorCode::InvalidInput,
                "Invalid input provided",
                e.body_text(),
            ),
            JsonRejection::JsonSyntaxError(_) => {
                ApiError::with_code(ErrorCode::InvalidFormat, "Invalid JSON format")
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::with_code(ErrorCode::InvalidFormat, "JSON content type required")
            }
            JsonRejection::BytesRejection(_) => {
                ApiError::with_code(ErrorCode::InvalidInput, "Invalid request body format")
            }
            _ => ApiError::with_details(
                ErrorCode::InvalidInput,
                "Invalid input provided",
                err.body_text(),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(format!("Validation error: {}", errors))
    }
}

/// Response for a handler that panicked; installed through `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(details).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_expected_statuses() {
        assert_eq!(
            ApiError::already_exists("User").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::unknown_account().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::invalid_credentials().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::missing_fields().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::password_mismatch().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::activation_expired().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::activation_invalid().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("User").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Unauthorized("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("user".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_match_client_contract() {
        assert_eq!(
            ApiError::already_exists("User").client_message(),
            "User already exists"
        );
        assert_eq!(ApiError::not_found("User").client_message(), "User not found");
        assert_eq!(ApiError::missing_fields().client_message(), "Please provide all fields");
    }

    #[test]
    fn test_server_errors_hide_internal_detail() {
        let err = ApiError::Internal("connection string with password".into());
        assert_eq!(err.client_message(), "An internal server error occurred");
    }

    #[test]
    fn test_error_code_serializes_to_tag() {
        let json = serde_json::to_string(&ErrorCode::AlreadyExists).unwrap();
        assert_eq!(json, "\"RES_4002\"");
        assert_eq!(ErrorCode::AlreadyExists.code(), 4002);
    }

    #[test]
    fn test_panic_payload_becomes_internal_error() {
        let response = panic_response(Box::new("handler exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
