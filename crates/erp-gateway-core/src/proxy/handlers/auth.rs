//! Login passthrough and logout.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use super::{relay_status, ApiError};
use crate::modules::logger::mask_credential;
use crate::proxy::middleware::require_bearer_token;
use crate::proxy::server::GatewayState;
use crate::proxy::session::{extract_session_id, session_cookie};
use erp_gateway_types::GatewayError;

/// Forward credentials to the backend login and remember the session it opens.
pub async fn handle_login(State(state): State<GatewayState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return ApiError::from(GatewayError::BadRequest {
                message: format!("Invalid request body: {}", e),
            })
            .into_response();
        },
    };

    let reply = match state.client.login(payload).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            return ApiError::from(GatewayError::Upstream {
                status: None,
                message: "Etendo Classic backend is not accessible".into(),
            })
            .into_response();
        },
    };

    if !reply.is_json() {
        return ApiError::from(GatewayError::InvalidResponse {
            message: "Invalid response format from Etendo Classic".into(),
        })
        .into_response();
    }

    if reply.is_success() {
        let token = reply.body.get("token").and_then(Value::as_str);
        match (token, extract_session_id(&reply.headers)) {
            (Some(token), Some(session_id)) => {
                let csrf_token = reply.body.get("csrfToken").and_then(Value::as_str);
                if let Err(e) = state.store.set_session(token, &session_cookie(&session_id), csrf_token) {
                    tracing::warn!(error = %e, "Could not store login session");
                } else {
                    tracing::info!(credential = %mask_credential(token), "Stored ERP session for login");
                }
            },
            (Some(_), None) => tracing::warn!("Login response carried no JSESSIONID"),
            (None, _) => tracing::debug!("Login response carried no token"),
        }
    }

    (relay_status(Some(reply.status)), Json(reply.body)).into_response()
}

/// Drop the stored session and both recovery counters of the credential.
pub async fn handle_logout(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    let token = match require_bearer_token(&headers, "Missing Bearer token") {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    state.store.clear_session(&token);
    state.session_recovery.clear_recovery_attempts(&token);
    state.csrf_recovery.clear_recovery_attempts(&token);
    tracing::info!(credential = %mask_credential(&token), "Cleared ERP session");

    Json(json!({ "success": true })).into_response()
}
