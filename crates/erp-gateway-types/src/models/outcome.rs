//! Caller-visible result of a proxied request run through recovery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unified outcome of one orchestrated request.
///
/// A failed outcome still carries the last backend payload in `data` when one
/// was received, so handlers can preserve the backend's error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub recovered: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub csrf_recovered: bool,
    /// Replacement credential issued by the backend during session recovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_token: Option<String>,
    /// Status of the last backend response, for mapping failures to HTTP.
    #[serde(skip)]
    pub upstream_status: Option<u16>,
}

impl Outcome {
    pub fn ok(data: Value, status: u16) -> Self {
        Self { success: true, data: Some(data), upstream_status: Some(status), ..Self::default() }
    }

    pub fn recovered(data: Value, status: u16, csrf_recovered: bool) -> Self {
        Self { recovered: true, csrf_recovered, ..Self::ok(data, status) }
    }

    pub fn failure(error: impl Into<String>, data: Option<Value>, status: Option<u16>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
            upstream_status: status,
            ..Self::default()
        }
    }

    pub fn with_new_token(mut self, new_token: Option<String>) -> Self {
        self.new_token = new_token;
        self
    }
}

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature")]
fn is_false(value: &bool) -> bool {
    !*value
}
