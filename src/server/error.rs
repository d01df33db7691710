//! HTTP error boundary for the relay.
//!
//! Handlers return `Result<Response, ApiError>`. Shape errors are answered
//! with their message as plain text. Internal errors are logged with their
//! full cause chain and backtrace, and the caller only ever sees
//! `Internal Server Error`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned for every internal failure
pub const INTERNAL_SERVER_ERROR_BODY: &str = "Internal Server Error";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Errors a relay route can answer with
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body does not have the expected shape
    #[error("{0}")]
    BadRequest(String),

    /// Anything else: provider failures, transport errors, bugs
    #[error("internal error on {route}: {error}")]
    Internal {
        /// Route that failed, for the log line
        route: &'static str,
        /// Underlying error, never shown to the caller
        error: anyhow::Error,
    },
}

impl ApiError {
    /// Shape error; the message is prefixed with `Invalid request: `
    pub fn invalid_request(detail: impl AsRef<str>) -> Self {
        Self::BadRequest(format!("Invalid request: {}", detail.as_ref()))
    }

    /// Internal error raised while serving `route`
    pub fn internal(route: &'static str, error: anyhow::Error) -> Self {
        Self::Internal { route, error }
    }
}

/// Log a route failure with every diagnostic detail available
pub fn log_route_error(route: &str, err: &anyhow::Error) {
    let causes: Vec<String> = err.chain().skip(1).map(|cause| cause.to_string()).collect();
    tracing::error!(
        route,
        error = %err,
        causes = ?causes,
        backtrace = %err.backtrace(),
        "Chat route error"
    );
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "Rejected relay request");
                (
                    StatusCode::BAD_REQUEST,
                    [(header::CONTENT_TYPE, PLAIN_TEXT)],
                    message,
                )
                    .into_response()
            }
            ApiError::Internal { route, error } => {
                log_route_error(route, &error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, PLAIN_TEXT)],
                    INTERNAL_SERVER_ERROR_BODY,
                )
                    .into_response()
            }
        }
    }
}
