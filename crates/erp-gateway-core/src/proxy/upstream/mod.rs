//! Backend transport and the response shape the recovery core inspects.

pub mod client;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::error::UpstreamError;

/// A fully-read backend response: status, headers and the parsed body.
///
/// `body` is `Value::Null` when the backend sent nothing or something that is
/// not JSON; the raw text stays available in `text`.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl UpstreamReply {
    pub fn new(status: u16, body: Value) -> Self {
        let text = if body.is_null() { String::new() } else { body.to_string() };
        Self { status, headers: HeaderMap::new(), body, text }
    }

    /// Append a header value (repeated names such as `set-cookie` are kept).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) =
            (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
        {
            self.headers.append(name, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        !self.body.is_null() || self.text.trim() == "null"
    }

    /// Read the whole response body and parse it leniently as JSON.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, UpstreamError> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(Self { status, headers, body, text })
    }
}
