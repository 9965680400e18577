//! Unified error types for the gateway core.

use thiserror::Error;

/// Main error type for gateway operations outside the recovery taxonomy.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for gateway operations.
pub type AppResult<T> = Result<T, AppError>;

/// Transport failure of a single outbound backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection, DNS, TLS or body-read failure
    #[error("{0}")]
    Transport(String),

    /// Request could not be constructed (bad header value, bad URL)
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
