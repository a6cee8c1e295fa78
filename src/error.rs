use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::cache::CacheError;
use crate::relay::RelayError;

pub mod codes {
    pub const VALIDATION: &str = "validation_error";
    pub const UPSTREAM_UNREACHABLE: &str = "upstream_unreachable";
    pub const UPSTREAM_TIMEOUT: &str = "upstream_timeout";
    pub const CACHE_UNAVAILABLE: &str = "cache_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub code: &'static str,
    pub message: String,
}

/// Every failure a handler can surface, each with its own status and code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {field} {reason}")]
    Validation { field: &'static str, reason: String },
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl AppError {
    pub fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "is required".to_string(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Validation {
            field: "body",
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Relay(RelayError::Unreachable { .. }) => StatusCode::BAD_GATEWAY,
            Self::Relay(RelayError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => codes::VALIDATION,
            Self::Relay(RelayError::Unreachable { .. }) => codes::UPSTREAM_UNREACHABLE,
            Self::Relay(RelayError::Timeout { .. }) => codes::UPSTREAM_TIMEOUT,
            Self::Relay(_) => codes::INTERNAL,
            Self::Cache(_) => codes::CACHE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), code, detail = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), code, detail = %message, "client request error");
        }

        let body = ErrorBody {
            error: ErrorMessage { code, message },
        };
        (status, Json(body)).into_response()
    }
}
