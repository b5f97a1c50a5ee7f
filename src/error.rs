use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the checker service
#[derive(Error, Debug)]
pub enum CheckerError {
    // Request errors
    #[error("ip parameter must be in IP:PORT format.")]
    InvalidFormat,

    #[error("port must be numeric.")]
    InvalidPort,

    #[error("Parameter '{0}' is required.")]
    MissingParameter(&'static str),

    // Probe errors
    #[error("Server error while processing proxy {input}: {reason}")]
    ProbeFailure { input: String, reason: String },

    #[error("An error occurred while processing the IP {input}: {reason}")]
    EndpointFailure { input: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for checker operations
pub type Result<T> = std::result::Result<T, CheckerError>;

impl CheckerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            CheckerError::InvalidFormat
            | CheckerError::InvalidPort
            | CheckerError::MissingParameter(_) => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            CheckerError::ProbeFailure { .. }
            | CheckerError::EndpointFailure { .. }
            | CheckerError::InvalidConfig(_)
            | CheckerError::Io(_)
            | CheckerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
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

impl IntoResponse for CheckerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
