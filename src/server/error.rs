//! Error types for the REST API server

use crate::error::AnalyticsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// A query failed inside the analytics engine
    Analytics(AnalyticsError),
    /// A query ran past the configured limit
    Timeout { query: &'static str, after: Duration },
    /// Internal server error
    InternalError(String),
}

impl ApiError {
    /// HTTP status and machine-readable kind for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Analytics(err) => {
                let status = match err {
                    AnalyticsError::EmptyBatch { .. } => StatusCode::NOT_FOUND,
                    AnalyticsError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    AnalyticsError::UnknownCategory { .. } | AnalyticsError::InvalidInput { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    AnalyticsError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    AnalyticsError::Model { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind())
            }
            ApiError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "Timeout"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Analytics(err) => write!(f, "{}", err),
            ApiError::Timeout { query, after } => {
                write!(f, "Query '{}' timed out after {:?}", query, after)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "query failed");
        }

        let body = Json(json!({
            "error": error_type,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        ApiError::Analytics(err)
    }
}
