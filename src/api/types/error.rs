//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::DomainError;

/// Message returned in place of infrastructure fault details
pub const GENERIC_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later";

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    NotFoundError,
    ConflictError,
    RateLimitError,
    ServerError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::AuthenticationError => write!(f, "authentication_error"),
            Self::PermissionError => write!(f, "permission_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ConflictError => write!(f, "conflict_error"),
            Self::RateLimitError => write!(f, "rate_limit_error"),
            Self::ServerError => write!(f, "server_error"),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    pub code: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        error_type: ApiErrorType,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: code.into(),
                },
            },
        }
    }

    /// Replace the stable error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = code.into();
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorType::InvalidRequestError,
            "bad_request",
            message,
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorType::InvalidRequestError,
            "validation_error",
            message,
        )
    }

    pub fn unauthorized(code: &str, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ApiErrorType::AuthenticationError,
            code,
            message,
        )
    }

    pub fn forbidden(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ApiErrorType::NotFoundError,
            "not_found",
            message,
        )
    }

    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, ApiErrorType::ConflictError, code, message)
    }

    pub fn rate_limited(code: &str, message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            ApiErrorType::RateLimitError,
            code,
            message,
        )
    }

    /// Internal server error with the generic message
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorType::ServerError,
            "internal_error",
            GENERIC_ERROR_MESSAGE,
        )
    }

    pub fn code(&self) -> &str {
        &self.response.error.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        if err.is_infrastructure_fault() {
            error!(error = %err, "Request failed with an internal error");
            return Self::internal();
        }

        let message = err.to_string();

        match &err {
            DomainError::Validation { message } => Self::validation(message),
            DomainError::Conflict { message } => Self::conflict("conflict", message),
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::InvalidCredentials => Self::unauthorized("invalid_credentials", message),
            DomainError::Unauthenticated => Self::unauthorized("unauthenticated", message),
            DomainError::EmailNotVerified => Self::forbidden("email_not_verified", message),
            DomainError::AccountDisabled => Self::forbidden("account_disabled", message),
            DomainError::RateLimited => Self::rate_limited("rate_limited", message),
            DomainError::InvalidOrExpiredCode => {
                Self::bad_request(message).with_code("invalid_or_expired_code")
            }
            DomainError::InvalidCode => Self::bad_request(message).with_code("invalid_code"),
            DomainError::AttemptsExceeded => {
                Self::rate_limited("attempts_exceeded", message)
            }
            DomainError::AlreadyVerified => Self::conflict("already_verified", message),
            DomainError::Signing { .. }
            | DomainError::Storage { .. }
            | DomainError::Notification { .. }
            | DomainError::Internal { .. } => Self::internal(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("Invalid id");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.response.error.error_type,
            ApiErrorType::InvalidRequestError
        );
        assert_eq!(err.response.error.message, "Invalid id");
        assert_eq!(err.code(), "bad_request");
    }

    #[test]
    fn test_domain_error_status_and_code() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST, "validation_error"),
            (DomainError::conflict("x"), StatusCode::CONFLICT, "conflict"),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND, "not_found"),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED, "invalid_credentials"),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED, "unauthenticated"),
            (DomainError::EmailNotVerified, StatusCode::FORBIDDEN, "email_not_verified"),
            (DomainError::AccountDisabled, StatusCode::FORBIDDEN, "account_disabled"),
            (DomainError::RateLimited, StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            (
                DomainError::InvalidOrExpiredCode,
                StatusCode::BAD_REQUEST,
                "invalid_or_expired_code",
            ),
            (DomainError::InvalidCode, StatusCode::BAD_REQUEST, "invalid_code"),
            (
                DomainError::AttemptsExceeded,
                StatusCode::TOO_MANY_REQUESTS,
                "attempts_exceeded",
            ),
            (DomainError::AlreadyVerified, StatusCode::CONFLICT, "already_verified"),
        ];

        for (domain_err, status, code) in cases {
            let api_err = ApiError::from(domain_err);
            assert_eq!(api_err.status, status);
            assert_eq!(api_err.code(), code);
        }
    }

    #[test]
    fn test_infrastructure_faults_are_hidden() {
        let api_err: ApiError =
            DomainError::storage("relation \"users\" does not exist").into();

        assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.code(), "internal_error");
        assert_eq!(api_err.response.error.message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::unauthorized("unauthenticated", "Authentication required");
        let json = serde_json::to_string(&err.response).unwrap();

        assert!(json.contains("\"type\":\"authentication_error\""));
        assert!(json.contains("\"code\":\"unauthenticated\""));
        assert!(json.contains("Authentication required"));
    }
}
