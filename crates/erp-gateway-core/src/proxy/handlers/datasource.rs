use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{outcome_response, ApiError};
use crate::modules::logger::mask_credential;
use crate::proxy::forwarding::{should_passthrough_json, RequestContext};
use crate::proxy::middleware::require_bearer_token;
use crate::proxy::server::GatewayState;
use crate::proxy::upstream::client::RequestBody;
use erp_gateway_types::GatewayError;

/// Keys that mark a params object as a SmartClient request.
const SMARTCLIENT_KEYS: [&str; 6] =
    ["operationType", "data", "oldValues", "dataSource", "componentId", "csrfToken"];

#[derive(Debug, Deserialize)]
struct DatasourceRequest {
    #[serde(default)]
    entity: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

pub async fn handle_datasource(
    State(state): State<GatewayState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let token = match require_bearer_token(&headers, "Missing user context") {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    let request: DatasourceRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return ApiError::from(GatewayError::BadRequest {
                message: format!("Invalid request body: {}", e),
            })
            .into_response();
        },
    };
    let Some(entity) = request.entity.filter(|e| !e.trim().is_empty()) else {
        return ApiError::from(GatewayError::BadRequest { message: "Entity is required".into() })
            .into_response();
    };
    let params = request.params.unwrap_or_else(|| Value::Object(Map::new()));

    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    let pass_json = should_passthrough_json(&uri.to_string())
        && content_type.contains("application/json")
        && is_smartclient_payload(&params);
    let payload = if pass_json { RequestBody::Json(params) } else { RequestBody::Form(form_fields(&params)) };

    tracing::debug!(
        entity = %entity,
        json = pass_json,
        credential = %mask_credential(&token),
        "Forwarding datasource request"
    );

    let context = RequestContext::from_headers(&headers, uri.to_string());
    let url = state.client.datasource_url(&entity);
    let client = state.client.clone();
    let bearer = token.clone();

    let outcome = state
        .orchestrator
        .execute_with_recovery(&context, &token, move |cookie| {
            let client = client.clone();
            let url = url.clone();
            let bearer = bearer.clone();
            let payload = payload.clone();
            async move { client.post(&url, Some(&bearer), &cookie, payload).await }
        })
        .await;

    outcome_response(outcome)
}

fn is_smartclient_payload(params: &Value) -> bool {
    params.as_object().is_some_and(|obj| SMARTCLIENT_KEYS.iter().any(|k| obj.contains_key(*k)))
}

/// Flatten datasource params into form fields.
///
/// `criteria` arrays collapse into one `[a,b]` string, other arrays repeat
/// the key, nulls are dropped.
pub fn form_fields(params: &Value) -> Vec<(String, String)> {
    let Some(obj) = params.as_object() else {
        return Vec::new();
    };

    let mut fields = Vec::with_capacity(obj.len());
    for (key, value) in obj {
        match value {
            Value::Null => {},
            Value::Array(items) if key == "criteria" => {
                let joined: Vec<String> = items.iter().map(form_value).collect();
                fields.push((key.clone(), format!("[{}]", joined.join(","))));
            },
            Value::Array(items) => {
                fields.extend(items.iter().map(|item| (key.clone(), form_value(item))));
            },
            other => fields.push((key.clone(), form_value(other))),
        }
    }
    fields
}

fn form_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
