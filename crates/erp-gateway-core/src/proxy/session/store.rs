//! Credential-keyed storage of backend session cookies and CSRF tokens.

use dashmap::DashMap;
use erp_gateway_types::SessionStoreError;

/// Backend session state bound to one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Raw `Cookie` header value sent to the backend (e.g. `JSESSIONID=...`)
    pub cookie_header: String,
    /// Most recently known CSRF token
    pub csrf_token: Option<String>,
}

/// Abstraction for session storage backends.
///
/// Implementations are synchronous and never block on I/O; a shared instance
/// is created once at startup and injected wherever sessions are read or written.
pub trait SessionStore: Send + Sync {
    /// Store or merge the session for `credential`.
    ///
    /// Rejects empty credentials and cookie headers. The CSRF token is only
    /// overwritten when a non-empty value is supplied.
    fn set_session(
        &self,
        credential: &str,
        cookie_header: &str,
        csrf_token: Option<&str>,
    ) -> Result<(), SessionStoreError>;

    /// Full record for `credential`; `None` for empty or unknown credentials.
    fn get_session(&self, credential: &str) -> Option<SessionRecord>;

    /// Remove the record. Unknown credentials are a no-op.
    fn clear_session(&self, credential: &str);

    fn get_cookie(&self, credential: &str) -> Option<String> {
        self.get_session(credential).map(|record| record.cookie_header)
    }

    fn get_csrf_token(&self, credential: &str) -> Option<String> {
        self.get_session(credential).and_then(|record| record.csrf_token)
    }
}

/// Process-wide in-memory session store.
///
/// Sessions are lost when the process restarts.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn set_session(
        &self,
        credential: &str,
        cookie_header: &str,
        csrf_token: Option<&str>,
    ) -> Result<(), SessionStoreError> {
        if credential.trim().is_empty() {
            return Err(SessionStoreError::invalid("credential"));
        }
        if cookie_header.trim().is_empty() {
            return Err(SessionStoreError::invalid("cookie_header"));
        }

        let csrf_token = csrf_token.filter(|t| !t.trim().is_empty()).map(str::to_string);

        self.sessions
            .entry(credential.to_string())
            .and_modify(|record| {
                record.cookie_header = cookie_header.to_string();
                if let Some(token) = &csrf_token {
                    record.csrf_token = Some(token.clone());
                }
            })
            .or_insert_with(|| SessionRecord {
                cookie_header: cookie_header.to_string(),
                csrf_token: csrf_token.clone(),
            });
        Ok(())
    }

    fn get_session(&self, credential: &str) -> Option<SessionRecord> {
        if credential.is_empty() {
            return None;
        }
        self.sessions.get(credential).map(|r| r.clone())
    }

    fn clear_session(&self, credential: &str) {
        self.sessions.remove(credential);
    }
}
