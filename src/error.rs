//! HTTP error responses.

use crate::runtime::RuntimeError;
use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid password")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    /// Duplicate user. Reported as 500 like any other runtime failure.
    #[error("{0}")]
    Conflict(String),

    /// Runtime failure; the message is the runtime's stderr.
    #[error("{0}")]
    Runtime(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::Runtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            RuntimeError::CommandFailed { .. } | RuntimeError::Spawn(_) => {
                Self::Runtime(err.to_string())
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Conflict(msg) | Self::Runtime(msg) => {
                debug!(status = status.as_u16(), error = %msg.trim(), "runtime operation failed");
                json!({ "success": false, "error": msg })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn runtime_errors_map_to_server_errors() {
        let conflict = ApiError::from(RuntimeError::AlreadyExists("bob".to_string()));
        assert!(matches!(conflict, ApiError::Conflict(ref m) if m == "User already exists"));
        assert_eq!(conflict.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let failed = ApiError::from(RuntimeError::CommandFailed {
            stderr: "boom\n".to_string(),
        });
        assert!(matches!(failed, ApiError::Runtime(ref m) if m == "boom\n"));

        let spawn = ApiError::from(RuntimeError::Spawn(io::Error::new(
            io::ErrorKind::NotFound,
            "docker not found",
        )));
        assert!(matches!(spawn, ApiError::Runtime(ref m) if m == "docker not found"));
    }

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(
            ApiError::BadRequest("Missing user id".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }
}
