//! Application error types
//!
//! One taxonomy shared by the collector, the agent and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use thiserror::Error;

use crate::api::response::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed beacon: {0}")]
    Decode(#[source] bincode::Error),

    #[error("could not encode beacon: {0}")]
    Encode(#[source] bincode::Error),

    #[error("beacon payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("render failed: {0}")]
    Render(#[from] std::fmt::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }

    pub fn config(msg: &str) -> Self {
        AppError::Config(msg.to_string())
    }

    /// Error code used in the JSON error envelope
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Decode(_) | AppError::PayloadTooLarge { .. } => "BAD_REQUEST",
            AppError::Encode(_) => "ENCODE_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Decode(_) | AppError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        let status = self.status();
        let body = ApiResponse::error(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
