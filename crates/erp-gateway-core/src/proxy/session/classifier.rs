//! Stateless classification of backend responses into session-expired,
//! CSRF-invalid, recoverable or terminal.
//!
//! Every function is pure: the same reply always yields the same answer and no
//! input shape can make them fail.

use serde::Deserialize;
use serde_json::Value;

use crate::proxy::upstream::UpstreamReply;

/// Message the backend embeds in a 200 response when the CSRF token is stale.
pub const INVALID_CSRF_TOKEN: &str = "InvalidCSRFToken";

/// `{ "response": { "error": { "message": "..." } } }`
#[derive(Debug, Deserialize)]
struct EmbeddedError {
    response: EmbeddedErrorResponse,
}

#[derive(Debug, Deserialize)]
struct EmbeddedErrorResponse {
    error: EmbeddedErrorBody,
}

#[derive(Debug, Deserialize)]
struct EmbeddedErrorBody {
    message: String,
}

impl EmbeddedError {
    fn parse(body: &Value) -> Option<Self> {
        Self::deserialize(body).ok()
    }
}

/// Combined verdict over one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionErrorClass {
    pub is_session_expired: bool,
    pub is_invalid_csrf: bool,
    pub is_recoverable: bool,
}

/// 401/403, or an `error`/`message` text that reads like an expired session.
pub fn is_session_expired(reply: &UpstreamReply) -> bool {
    if matches!(reply.status, 401 | 403) {
        return true;
    }
    ["error", "message"]
        .iter()
        .filter_map(|field| reply.body.get(field).and_then(Value::as_str))
        .any(message_indicates_expiry)
}

fn message_indicates_expiry(message: &str) -> bool {
    let text = message.to_lowercase();
    let session_problem = text.contains("session")
        && (text.contains("expired") || text.contains("timeout") || text.contains("invalid"));

    session_problem
        || text.contains("unauthorized")
        || text.contains("authentication")
        || text.contains("login required")
}

/// 403 is a hard authorization denial and never triggers re-authentication.
pub fn should_attempt_recovery(reply: &UpstreamReply) -> bool {
    is_session_expired(reply) && reply.status != 403
}

pub fn is_invalid_csrf_token_error(body: &Value) -> bool {
    EmbeddedError::parse(body).is_some_and(|e| e.response.error.message == INVALID_CSRF_TOKEN)
}

/// The backend reports a stale CSRF token as a 200 with an embedded error.
pub fn should_attempt_csrf_recovery(reply: &UpstreamReply) -> bool {
    reply.status == 200 && is_invalid_csrf_token_error(&reply.body)
}

pub fn classify_session_error(reply: &UpstreamReply) -> SessionErrorClass {
    let is_session_expired = is_session_expired(reply);
    let is_invalid_csrf = is_invalid_csrf_token_error(&reply.body);
    SessionErrorClass {
        is_session_expired,
        is_invalid_csrf,
        is_recoverable: is_session_expired || is_invalid_csrf,
    }
}
