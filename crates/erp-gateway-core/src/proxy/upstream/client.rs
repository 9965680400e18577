use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

use super::UpstreamReply;
use crate::error::{AppError, UpstreamError};
use crate::proxy::session::ReauthBackend;

const LOGIN_PATH: &str = "/meta/login";
const DATASOURCE_PATH: &str = "/meta/forward/org.openbravo.service.datasource";
const KEEP_ALIVE_PATH: &str = "/org.openbravo.client.kernel?IsAjaxCall=1&ignoreForSessionTimeout=1&_action=org.openbravo.client.application.AlertActionHandler";

/// Body of an outbound backend call.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Build the shared HTTP client used for every backend call.
pub fn build_http_client(timeout_secs: u64) -> Result<Client, AppError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(timeout_secs.max(5)))
        .tcp_nodelay(true)
        .build()
        .map_err(AppError::Network)
}

/// Join a base URL and a path with exactly one `/` between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Transport to the legacy ERP backend.
#[derive(Debug, Clone)]
pub struct ErpClient {
    http_client: Client,
    base_url: String,
}

impl ErpClient {
    /// Accepts a pre-built `reqwest::Client` so tests and the server share one
    /// connection pool.
    pub fn new(http_client: Client, base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;
        Ok(Self { http_client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        join_url(&self.base_url, LOGIN_PATH)
    }

    pub fn datasource_url(&self, entity: &str) -> String {
        join_url(&self.base_url, &format!("{}/{}", DATASOURCE_PATH, entity))
    }

    pub fn keep_alive_url(&self) -> String {
        join_url(&self.base_url, KEEP_ALIVE_PATH)
    }

    /// Issue one POST and read the full response.
    ///
    /// Non-2xx statuses are returned as `Ok(UpstreamReply)`; only transport
    /// failures become `Err`.
    pub async fn post(
        &self,
        url: &str,
        bearer: Option<&str>,
        cookie_header: &str,
        body: RequestBody,
    ) -> Result<UpstreamReply, UpstreamError> {
        let headers = build_headers(bearer, cookie_header)?;
        let request = self.http_client.post(url).headers(headers);
        let request = match body {
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Form(fields) => request.form(&fields),
        };

        let response = request.send().await?;
        tracing::debug!(status = response.status().as_u16(), url = %url, "ERP response");
        UpstreamReply::from_response(response).await
    }

    /// Forward a login payload as-is to the backend login endpoint.
    pub async fn login(&self, payload: Value) -> Result<UpstreamReply, UpstreamError> {
        self.post(&self.login_url(), None, "", RequestBody::Json(payload)).await
    }
}

fn build_headers(bearer: Option<&str>, cookie_header: &str) -> Result<header::HeaderMap, UpstreamError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    if let Some(token) = bearer {
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?,
        );
    }

    if !cookie_header.is_empty() {
        headers.insert(
            header::COOKIE,
            header::HeaderValue::from_str(cookie_header)
                .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?,
        );
    }

    Ok(headers)
}

#[async_trait]
impl ReauthBackend for ErpClient {
    async fn reauthenticate(
        &self,
        credential: &str,
        stale_cookie: Option<&str>,
    ) -> Result<UpstreamReply, UpstreamError> {
        self.post(
            &self.login_url(),
            Some(credential),
            stale_cookie.unwrap_or_default(),
            RequestBody::Json(Value::Object(serde_json::Map::new())),
        )
        .await
    }
}
