//! Session and CSRF recovery errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which recovery path an attempt counter or error belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryKind {
    /// Re-authentication against the backend login endpoint.
    Session,
    /// Session id re-extraction from an InvalidCSRFToken response.
    Csrf,
}

impl RecoveryKind {
    fn max_attempts_message(self) -> &'static str {
        match self {
            Self::Session => "Maximum recovery attempts exceeded",
            Self::Csrf => "Maximum CSRF recovery attempts exceeded",
        }
    }
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Csrf => f.write_str("CSRF"),
        }
    }
}

/// Failure reasons of the session and CSRF recovery services.
///
/// Recovery never lets a raw fault escape: network errors, parse errors and
/// malformed headers all end up in one of these variants.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum RecoveryError {
    /// No credential supplied to a recovery function.
    #[error("No user token provided")]
    MissingCredential,

    /// CSRF recovery turned off by configuration.
    #[error("CSRF recovery is disabled")]
    RecoveryDisabled,

    /// CSRF recovery invoked on a response that is not an InvalidCSRFToken failure.
    #[error("Response does not contain InvalidCSRFToken error")]
    NotCsrfError,

    /// Per-credential, per-kind attempt bound reached.
    #[error("{}", .kind.max_attempts_message())]
    MaxAttemptsExceeded {
        /// Recovery path whose counter is exhausted
        kind: RecoveryKind,
        /// Configured ceiling
        max: u32,
    },

    /// CSRF recovery invoked on a non-200 response.
    #[error("Unexpected response status for CSRF error: {status}")]
    UnexpectedStatus {
        /// Status code of the offending response
        status: u16,
    },

    /// No new session id could be taken from the CSRF error response.
    #[error("Failed to extract or update session from CSRF error response")]
    SessionUpdateFailed,

    /// The login response carried no session cookie.
    #[error("No session id received in re-authentication response")]
    NoSessionIdReceived,

    /// Backend rejected the re-authentication call.
    #[error("Re-authentication failed: {status} {message}")]
    ReauthenticationFailed {
        /// Backend status code
        status: u16,
        /// Error text from the body, or the canonical reason phrase
        message: String,
    },

    /// Re-authentication exceeded its deadline.
    #[error("Session recovery timed out")]
    Timeout {
        /// Deadline that was exceeded
        timeout_ms: u64,
    },

    /// Unexpected fault (network failure, malformed response).
    #[error("{message}")]
    Unexpected {
        /// Underlying fault message
        message: String,
    },
}

impl RecoveryError {
    /// Wrap any displayable fault as the catch-all variant.
    pub fn unexpected(err: impl fmt::Display) -> Self {
        Self::Unexpected { message: err.to_string() }
    }

    /// True when the credential's attempt bound is reached and only an explicit
    /// reset re-enables recovery.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::MaxAttemptsExceeded { .. })
    }
}
