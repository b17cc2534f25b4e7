//! HTTP error classification for the completion client.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::domain::ports::CompletionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("client error ({status}): {body}")]
    Client { status: u16, body: String },

    #[error("network failure: {0}")]
    Network(String),
}

impl ApiError {
    /// Classify a non-success HTTP status, reading `retry-after` when the
    /// provider supplies one.
    pub fn from_status(status: StatusCode, retry_after: Option<Duration>, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { retry_after },
            s if s.is_server_error() => ApiError::Server {
                status: s.as_u16(),
                body,
            },
            s => ApiError::Client {
                status: s.as_u16(),
                body,
            },
        }
    }

    /// Fold into the port-level error, substituting `default_wait` when the
    /// provider suggested no retry-after of its own.
    pub fn into_completion_error(self, default_wait: Duration) -> CompletionError {
        match self {
            ApiError::RateLimited { retry_after } => CompletionError::RateLimited {
                retry_after: retry_after.unwrap_or(default_wait),
            },
            ApiError::Server { status, body } => {
                CompletionError::Transient(format!("HTTP {status}: {body}"))
            }
            ApiError::Network(msg) => CompletionError::Transient(msg),
            ApiError::Auth(msg) => CompletionError::Fatal(format!("authentication failed: {msg}")),
            ApiError::Client { status, body } => {
                CompletionError::Fatal(format!("HTTP {status}: {body}"))
            }
        }
    }
}
