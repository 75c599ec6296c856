//! JSON error envelope returned by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Machine-readable error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

/// Error response envelope
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: ApiErrorType, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                },
            },
        }
    }

    /// Names the offending request parameter or field
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorType::InvalidRequestError,
            message,
        )
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorType::ServerError,
            message,
        )
    }

    /// Service unavailable
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::InvalidId { message } => Self::bad_request(message).with_param("id"),
            DomainError::Configuration { message } => Self::internal(message),
            DomainError::Internal { message } => Self::internal(message),
            DomainError::Storage { message } => Self::internal(message),
            // Cache failures are recovered inside the gateway; one reaching
            // this point is a bug, reported like any other server error.
            DomainError::Cache { message } => Self::internal(message),
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
