//! Mapping of failures to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::error::PromptslipError;

/// Handler error, rendered as a plain-text body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Processing error: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Promptslip(#[from] PromptslipError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Promptslip(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Promptslip(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(%status, error = %message, "Request failed");
        }
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let unsupported = AppError::from(PromptslipError::UnsupportedFormat {
            content_type: "text/plain".to_string(),
        });
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unsupported.to_string(), "Unsupported file type");

        let sink = AppError::from(PromptslipError::Sink("Printer connection failed".to_string()));
        assert_eq!(sink.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            AppError::NotFound("gone".to_string()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
