use reqwest::header::{HeaderMap, SET_COOKIE};
use regex::Regex;
use std::sync::OnceLock;

pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

fn session_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"JSESSIONID=([^;]+)").expect("JSESSIONID regex is valid"))
}

/// Find the backend session id in the `set-cookie` header(s).
///
/// Repeated headers are scanned in order; the first match wins. Values that are
/// not valid UTF-8 are skipped.
pub fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    let re = session_id_regex();
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| re.captures(value).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|id| !id.is_empty())
}

/// `Cookie` header value forwarded to the backend for a session id.
pub fn session_cookie(session_id: &str) -> String {
    format!("{}={}", SESSION_COOKIE_NAME, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_single_set_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(SET_COOKIE, HeaderValue::from_static("JSESSIONID=NEW123; Path=/; HttpOnly"));
        assert_eq!(extract_session_id(&headers).as_deref(), Some("NEW123"));
    }

    #[test]
    fn test_repeated_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("theme=dark; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("JSESSIONID=ABC; Path=/etendo"));
        headers.append(SET_COOKIE, HeaderValue::from_static("JSESSIONID=LATER"));
        assert_eq!(extract_session_id(&headers).as_deref(), Some("ABC"));
    }

    #[test]
    fn test_missing_session_cookie() {
        let mut headers = HeaderMap::new();
        assert!(extract_session_id(&headers).is_none());
        headers.insert(SET_COOKIE, HeaderValue::from_static("other=1"));
        assert!(extract_session_id(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_format() {
        assert_eq!(session_cookie("XYZ"), "JSESSIONID=XYZ");
    }
}
