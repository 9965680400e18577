use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::header::SET_COOKIE;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{outcome_response, relay_status, ApiError};
use crate::error::UpstreamError;
use crate::proxy::forwarding::RequestContext;
use crate::proxy::middleware::require_bearer_token;
use crate::proxy::server::GatewayState;
use crate::proxy::upstream::client::RequestBody;
use erp_gateway_types::GatewayError;

/// What the last keep-alive reply looked like beyond its body.
#[derive(Debug, Default)]
struct LastReply {
    new_cookie: AtomicBool,
    json: AtomicBool,
}

/// Ping the backend session without extending its timeout.
///
/// A reply that sets a new cookie means the old session was gone; the JSON
/// is relayed with `result: "failed"`.
pub async fn handle_keep_alive(
    State(state): State<GatewayState>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let token = match require_bearer_token(&headers, "Missing Bearer token") {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    let context = RequestContext::from_headers(&headers, uri.to_string());
    if state.forwarder.erp_auth_headers(&context, Some(&token)).cookie_header.is_empty() {
        return ApiError::from(GatewayError::NoSession).into_response();
    }

    let last = Arc::new(LastReply::default());
    let observed = Arc::clone(&last);
    let client = state.client.clone();
    let url = client.keep_alive_url();
    let bearer = token.clone();

    let outcome = state
        .orchestrator
        .execute_with_recovery(&context, &token, move |cookie| {
            let client = client.clone();
            let url = url.clone();
            let bearer = bearer.clone();
            let observed = Arc::clone(&observed);
            async move {
                let reply = client
                    .post(&url, Some(&bearer), &cookie, RequestBody::Json(Value::Object(Map::new())))
                    .await?;
                observed.new_cookie.store(reply.headers.contains_key(SET_COOKIE), Ordering::Relaxed);
                observed.json.store(reply.is_json(), Ordering::Relaxed);
                Ok::<_, UpstreamError>(reply)
            }
        })
        .await;

    if !outcome.success {
        return outcome_response(outcome);
    }
    if !last.json.load(Ordering::Relaxed) {
        return ApiError::from(GatewayError::InvalidResponse {
            message: "Invalid response format from Etendo Classic".into(),
        })
        .into_response();
    }

    let mut data = outcome.data.unwrap_or(Value::Null);
    if last.new_cookie.load(Ordering::Relaxed) {
        tracing::info!("Keep-alive reply carried a new session cookie, reporting failed");
        if let Value::Object(obj) = &mut data {
            obj.insert("result".into(), Value::String("failed".into()));
        } else {
            let mut obj = Map::new();
            obj.insert("result".into(), Value::String("failed".into()));
            data = Value::Object(obj);
        }
    }

    (relay_status(outcome.upstream_status), Json(data)).into_response()
}
