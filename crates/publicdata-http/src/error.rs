//! # Design
//!
//! - Structured, constant-message errors for the acquisition layer.
//! - Capture the request URL and observed status so failures reproduce in
//!   tests without parsing message strings.
//! - Preserve source errors instead of interpolating them into messages.

use std::io;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors produced by fetching and downloading.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The underlying client could not be constructed.
    #[error("http client build failure")]
    ClientBuild {
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// Transport-level failure: connect, DNS, timeout, or interrupted body.
    #[error("http transport failure")]
    Transport {
        /// URL of the failed request.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// Retryable status (5xx, 429, or 408) still present on the final attempt.
    #[error("http retryable status persisted")]
    RetryableStatus {
        /// URL of the failed request.
        url: String,
        /// Status code returned by the server.
        status: StatusCode,
    },
    /// Non-retryable client error status (4xx other than 429 and 408).
    #[error("http client error status")]
    ClientStatus {
        /// URL of the failed request.
        url: String,
        /// Status code returned by the server.
        status: StatusCode,
    },
    /// Response declared an HTML content type where a data file was expected.
    #[error("http unexpected html response")]
    ContentType {
        /// URL of the rejected response.
        url: String,
        /// Declared content type of the response.
        content_type: String,
    },
    /// The request budget was consumed without a single attempt executing.
    #[error("http attempts exhausted")]
    AttemptsExhausted {
        /// URL of the request that never ran.
        url: String,
        /// Attempt budget that was configured.
        attempts: u32,
    },
    /// The request could not be built or dispatched at all.
    #[error("http invalid request")]
    Request {
        /// URL of the unbuildable request.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// IO failure while writing a downloaded body to disk.
    #[error("http io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl HttpError {
    pub(crate) fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
