//! Session store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by session store writes.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum SessionStoreError {
    /// Credential or cookie header was empty or whitespace
    #[error("Invalid session input: {field} must not be empty")]
    InvalidInput {
        /// Name of the rejected argument
        field: String,
    },
}

impl SessionStoreError {
    pub fn invalid(field: &str) -> Self {
        Self::InvalidInput { field: field.to_string() }
    }
}
