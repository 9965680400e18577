//! Route-level errors of the gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the proxy route handlers to the browser.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum GatewayError {
    /// Missing bearer token or missing backend session
    #[error("Unauthorized - {message}")]
    Unauthorized { message: String },

    /// Malformed request body
    #[error("{message}")]
    BadRequest { message: String },

    /// Backend call failed, possibly after recovery
    #[error("{message}")]
    Upstream {
        /// Last backend status, if a response was received
        status: Option<u16>,
        message: String,
    },

    /// Backend returned something the gateway cannot interpret
    #[error("{message}")]
    InvalidResponse { message: String },

    /// Bearer token present but no backend session is stored for it
    #[error("No session found")]
    NoSession,
}

impl GatewayError {
    /// Get HTTP status code for this error.
    ///
    /// Upstream failures keep the backend's status when it is an error status.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } | Self::NoSession => 401,
            Self::BadRequest { .. } => 400,
            Self::Upstream { status: Some(code), .. } if (400..600).contains(code) => *code,
            Self::Upstream { .. } | Self::InvalidResponse { .. } => 500,
        }
    }
}
