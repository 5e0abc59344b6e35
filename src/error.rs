use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the Beacon service
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store unavailable")]
    StoreUnavailable,

    // Push errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Write timed out after {millis}ms")]
    WriteTimeout { millis: u64 },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Beacon operations
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(_) | AppError::InvalidConfig(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // 503 Service Unavailable
            AppError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            // 504 Gateway Timeout
            AppError::WriteTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            AppError::Redis(_)
            | AppError::WebSocket(_)
            | AppError::ConnectionClosed
            | AppError::Metrics(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<axum::Error> for AppError {
    fn from(err: axum::Error) -> Self {
        AppError::WebSocket(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InvalidConfig(err.to_string())
    }
}
