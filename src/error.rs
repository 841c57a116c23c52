use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("{0}")]
    Decode(String),

    #[error("Invalid simulation config: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ToolkitError {
    fn from(err: serde_json::Error) -> Self {
        ToolkitError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for ToolkitError {
    fn from(err: reqwest::Error) -> Self {
        ToolkitError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ToolkitError {
    fn from(err: std::io::Error) -> Self {
        ToolkitError::Internal(err.to_string())
    }
}

impl From<prometheus::Error> for ToolkitError {
    fn from(err: prometheus::Error) -> Self {
        ToolkitError::Internal(err.to_string())
    }
}

impl IntoResponse for ToolkitError {
    fn into_response(self) -> Response {
        let status = match self {
            ToolkitError::Decode(_) | ToolkitError::Validation(_) => StatusCode::BAD_REQUEST,
            ToolkitError::Config(_) | ToolkitError::Transport(_) | ToolkitError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ToolkitError>;
