//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::StackError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Error raised by the stacking library
    Stack(StackError),
}

fn stack_error_code(err: &StackError) -> &'static str {
    match err {
        StackError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
        StackError::ParseError { .. } => "PARSE_ERROR",
        StackError::ValidationError { .. } => "VALIDATION_ERROR",
        StackError::IoError { .. } => "IO_ERROR",
        StackError::SerializationError { .. } => "SERIALIZATION_ERROR",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Stack(e) => {
                let status = if e.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let context = e.context().to_string();
                let mut api_error = ApiError::new(stack_error_code(&e), e.to_string().trim_end());
                if !context.is_empty() {
                    api_error = api_error.with_details(context);
                }
                (status, api_error)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<StackError> for AppError {
    fn from(err: StackError) -> Self {
        AppError::Stack(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
