//! Axum route handlers of the ERP proxy.

pub mod auth;
pub mod datasource;
pub mod keep_alive;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use erp_gateway_types::{GatewayError, Outcome};

/// Response header carrying a credential the backend rotated during recovery.
pub const NEW_TOKEN_HEADER: &str = "x-new-token";

/// Route-level error rendered as `{ "error": ..., "data": ... }`.
#[derive(Debug)]
pub struct ApiError {
    error: GatewayError,
    data: Option<Value>,
}

impl ApiError {
    pub fn with_data(error: GatewayError, data: Option<Value>) -> Self {
        Self { error, data }
    }

    pub fn status_code(&self) -> u16 {
        self.error.http_status_code()
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        Self { error, data: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match self.data {
            Some(data) => json!({ "error": self.error.to_string(), "data": data }),
            None => json!({ "error": self.error.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

fn relay_status(status: Option<u16>) -> StatusCode {
    status.and_then(|s| StatusCode::from_u16(s).ok()).unwrap_or(StatusCode::OK)
}

/// Map an orchestrated outcome onto the browser-facing response.
///
/// Successes keep the backend status. Failures use the last backend error
/// status, else 500.
pub fn outcome_response(outcome: Outcome) -> Response {
    if !outcome.success {
        let message = outcome.error.unwrap_or_else(|| "Request failed".to_string());
        tracing::warn!(status = ?outcome.upstream_status, error = %message, "Proxied request failed");
        return ApiError::with_data(
            GatewayError::Upstream { status: outcome.upstream_status, message },
            outcome.data,
        )
        .into_response();
    }

    let mut response =
        (relay_status(outcome.upstream_status), Json(outcome.data.unwrap_or(Value::Null)))
            .into_response();
    if let Some(token) = outcome.new_token.and_then(|t| HeaderValue::from_str(&t).ok()) {
        response.headers_mut().insert(NEW_TOKEN_HEADER, token);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status_mapping() {
        let backend_error = Outcome::failure("Request failed with status 403", None, Some(403));
        assert_eq!(outcome_response(backend_error).status(), StatusCode::FORBIDDEN);

        let csrf_failure = Outcome::failure("CSRF recovery failed: x", None, Some(200));
        assert_eq!(outcome_response(csrf_failure).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let transport = Outcome::failure("connection refused", None, None);
        assert_eq!(outcome_response(transport).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_success_surfaces_new_token() {
        let outcome = Outcome::recovered(json!({}), 200, false).with_new_token(Some("fresh".into()));
        let response = outcome_response(outcome);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(NEW_TOKEN_HEADER).unwrap(), "fresh");
    }
}
