use crate::repositories::RepositoryError;
use crate::validation::{Violation, Violations};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The only message a client ever sees for a 500.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong.";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or incomplete input, or a path/body identity mismatch.
    #[error("invalid request: {0}")]
    Validation(Violations),
    #[error("no record with id {id}")]
    NotFound { id: i32 },
    /// The store rejected the operation.
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),
    #[error("unhandled failure: {0:#}")]
    Unhandled(anyhow::Error),
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(Violations::single(field, message))
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caused by the client rather than by the server.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

impl From<Violations> for ApiError {
    fn from(violations: Violations) -> Self {
        Self::Validation(violations)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Persistence(cause) => Self::Persistence(cause),
            RepositoryError::Unexpected(cause) => Self::Unhandled(cause),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    status_code: u16,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<Violation>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            violations: Vec::new(),
        }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Validation(violations) => {
                let body = ErrorResponse {
                    violations: violations.into_iter().collect(),
                    ..ErrorResponse::new(status, "One or more validation errors occurred.")
                };
                (status, Json(body)).into_response()
            }
            Self::NotFound { .. } => status.into_response(),
            Self::Persistence(_) | Self::Unhandled(_) => {
                (status, Json(ErrorResponse::internal())).into_response()
            }
        }
    }
}
