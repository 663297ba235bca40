use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::EngineError;

use super::error_response;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("simulation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("simulation task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) | ApiError::Engine(EngineError::Cancelled { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid server configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
