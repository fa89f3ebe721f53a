//! Error types for Motorpool

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::types::{ErrorResponse, FieldIssue};

/// Message shown to callers for any unexpected server-side failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid query parameters")]
    InvalidQuery(Vec<FieldIssue>),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("API server is not running. Start it with: motorpool serve")]
    UpstreamUnavailable,

    #[error("{context}: {status} {reason}{}", body_suffix(.body))]
    UpstreamError {
        context: &'static str,
        status: u16,
        reason: String,
        body: Option<String>,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("MCP error: {0}")]
    Mcp(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref().map(|b| format!(". {}", b)).unwrap_or_default()
}

impl Error {
    /// HTTP status used when this error reaches an API caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UpstreamUnavailable | Error::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            Error::InvalidQuery(issues) => ErrorResponse {
                error: "Invalid query parameters".into(),
                details: Some(issues),
            },
            Error::InvalidInput(message) | Error::NotFound(message) => ErrorResponse {
                error: message,
                details: None,
            },
            other => {
                tracing::error!("Request failed: {}", other);
                ErrorResponse {
                    error: INTERNAL_ERROR_MESSAGE.into(),
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<rmcp::service::ServiceError> for Error {
    fn from(err: rmcp::service::ServiceError) -> Self {
        Error::Mcp(err.to_string())
    }
}
