use axum::http::{header, HeaderMap};

use crate::proxy::handlers::ApiError;
use erp_gateway_types::GatewayError;

const BEARER_PREFIX: &str = "Bearer ";

/// Credential from `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if !value.starts_with(BEARER_PREFIX) {
        return None;
    }
    value.split(' ').nth(1).filter(|token| !token.is_empty()).map(str::to_string)
}

/// Like [`extract_bearer_token`], rejecting with 401 and `reason` when absent.
pub fn require_bearer_token(headers: &HeaderMap, reason: &str) -> Result<String, ApiError> {
    extract_bearer_token(headers).ok_or_else(|| {
        tracing::debug!(reason, "Rejecting request without bearer token");
        ApiError::from(GatewayError::Unauthorized { message: reason.to_string() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_rejects_other_schemes_and_blank_tokens() {
        assert!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")).is_none());
        assert!(extract_bearer_token(&headers("bearer abc")).is_none());
        assert!(extract_bearer_token(&headers("Bearer ")).is_none());
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_require_maps_to_unauthorized() {
        let err = require_bearer_token(&HeaderMap::new(), "Missing Bearer token").unwrap_err();
        assert_eq!(err.status_code(), 401);
    }
}
