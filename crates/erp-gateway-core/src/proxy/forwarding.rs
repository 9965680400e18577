//! Builds the single `Cookie` header sent to the backend from the browser's
//! own cookies and the ERP session stored for the credential.

use reqwest::header::{HeaderMap, COOKIE};
use std::sync::{Arc, OnceLock};
use url::Url;

use super::session::SessionStore;
use erp_gateway_types::ForwardConfig;

/// What the core needs to know about the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Incoming browser `cookie` header, if any
    pub cookie: Option<String>,
    /// Request URL, absolute or origin-relative (`/api/...?query`)
    pub url: String,
}

impl RequestContext {
    pub fn new(cookie: Option<&str>, url: impl Into<String>) -> Self {
        Self { cookie: cookie.map(str::to_string), url: url.into() }
    }

    pub fn from_headers(headers: &HeaderMap, url: impl Into<String>) -> Self {
        Self::new(headers.get(COOKIE).and_then(|v| v.to_str().ok()), url)
    }
}

/// Cookie and CSRF token for one backend call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErpAuthHeaders {
    pub cookie_header: String,
    pub csrf_token: Option<String>,
}

pub struct CookieForwarder {
    store: Arc<dyn SessionStore>,
    config: ForwardConfig,
}

impl CookieForwarder {
    pub fn new(store: Arc<dyn SessionStore>, config: ForwardConfig) -> Self {
        Self { store, config }
    }

    /// `"<browser cookies>; <ERP cookie>"`, either part omitted when absent.
    ///
    /// Empty when forwarding is disabled. The store is not consulted without a
    /// credential.
    pub fn combined_cookie_header(&self, context: &RequestContext, credential: Option<&str>) -> String {
        if !self.config.forward_cookies_enabled {
            return String::new();
        }

        let browser = context.cookie.as_deref().filter(|c| !c.is_empty());
        let erp = credential
            .filter(|c| !c.is_empty())
            .and_then(|c| self.store.get_cookie(c))
            .filter(|c| !c.is_empty());

        match (browser, erp) {
            (Some(browser), Some(erp)) => format!("{}; {}", browser, erp),
            (Some(browser), None) => browser.to_string(),
            (None, Some(erp)) => erp,
            (None, None) => String::new(),
        }
    }

    pub fn erp_auth_headers(&self, context: &RequestContext, credential: Option<&str>) -> ErpAuthHeaders {
        ErpAuthHeaders {
            cookie_header: self.combined_cookie_header(context, credential),
            csrf_token: credential
                .filter(|c| !c.is_empty())
                .and_then(|c| self.store.get_csrf_token(c)),
        }
    }
}

fn placeholder_origin() -> &'static Url {
    static ORIGIN: OnceLock<Url> = OnceLock::new();
    ORIGIN.get_or_init(|| Url::parse("http://localhost/").expect("placeholder origin is a valid URL"))
}

/// `isc_dataFormat=json` (any case) in the query string.
pub fn should_passthrough_json(url: &str) -> bool {
    let Ok(parsed) = Url::options().base_url(Some(placeholder_origin())).parse(url) else {
        return false;
    };
    parsed
        .query_pairs()
        .any(|(key, value)| key == "isc_dataFormat" && value.eq_ignore_ascii_case("json"))
}
