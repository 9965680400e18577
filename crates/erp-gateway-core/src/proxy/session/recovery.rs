//! Re-authentication of a credential against the backend login endpoint.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::attempts::AttemptCounter;
use super::cookie::{extract_session_id, session_cookie};
use super::store::SessionStore;
use crate::error::UpstreamError;
use crate::modules::logger::mask_credential;
use crate::proxy::upstream::UpstreamReply;
use erp_gateway_types::{RecoveryConfig, RecoveryError, RecoveryKind};

/// Outbound login call used to mint a fresh backend session.
#[async_trait]
pub trait ReauthBackend: Send + Sync {
    /// POST to the login endpoint with `Authorization: Bearer <credential>` and
    /// the stale cookie, if any, as context.
    async fn reauthenticate(
        &self,
        credential: &str,
        stale_cookie: Option<&str>,
    ) -> Result<UpstreamReply, UpstreamError>;
}

/// Successful re-authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecovery {
    /// Replacement credential when the backend rotated the token.
    pub new_token: Option<String>,
}

type RecoveryResult = Result<SessionRecovery, RecoveryError>;
type InFlightRecovery = Shared<BoxFuture<'static, RecoveryResult>>;

/// Bounded, single-flight session recovery.
///
/// Concurrent calls for one credential join the same backend round-trip and
/// observe the same result; only the caller that starts it counts an attempt.
pub struct SessionRecoveryService {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn ReauthBackend>,
    attempts: Arc<AttemptCounter>,
    timeout: Duration,
    in_flight: DashMap<String, InFlightRecovery>,
}

impl SessionRecoveryService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn ReauthBackend>,
        config: &RecoveryConfig,
    ) -> Self {
        Self {
            store,
            backend,
            attempts: Arc::new(AttemptCounter::new(
                RecoveryKind::Session,
                config.session_recovery_max_attempts,
            )),
            timeout: Duration::from_millis(config.session_recovery_timeout_ms),
            in_flight: DashMap::new(),
        }
    }

    pub async fn recover_session(&self, credential: &str) -> RecoveryResult {
        if credential.trim().is_empty() {
            return Err(RecoveryError::MissingCredential);
        }

        let recovery = match self.in_flight.entry(credential.to_string()) {
            Entry::Occupied(entry) if entry.get().peek().is_none() => {
                debug!(
                    credential = %mask_credential(credential),
                    "Joining in-flight session recovery"
                );
                entry.get().clone()
            },
            entry => {
                let attempt = self.attempts.try_begin(credential).inspect_err(|_| {
                    warn!(
                        credential = %mask_credential(credential),
                        max = self.attempts.max(),
                        "Session recovery attempts exhausted"
                    );
                })?;
                let recovery = self.start(credential.to_string(), attempt);
                entry.insert(recovery.clone());
                recovery
            },
        };

        let result = recovery.await;
        self.in_flight.remove_if(credential, |_, f| f.peek().is_some());

        match &result {
            Ok(done) => info!(
                credential = %mask_credential(credential),
                rotated = done.new_token.is_some(),
                "Session recovery succeeded"
            ),
            Err(e) => warn!(credential = %mask_credential(credential), error = %e, "Session recovery failed"),
        }
        result
    }

    fn start(&self, credential: String, attempt: u32) -> InFlightRecovery {
        let store = Arc::clone(&self.store);
        let backend = Arc::clone(&self.backend);
        let attempts = Arc::clone(&self.attempts);
        let timeout = self.timeout;

        async move {
            info!(
                credential = %mask_credential(&credential),
                attempt,
                max = attempts.max(),
                "Attempting session recovery"
            );
            reauthenticate(store.as_ref(), backend.as_ref(), &attempts, timeout, &credential).await
        }
        .boxed()
        .shared()
    }

    pub fn is_recovery_active(&self, credential: &str) -> bool {
        self.in_flight.get(credential).is_some_and(|f| f.peek().is_none())
    }

    pub fn recovery_attempts(&self, credential: &str) -> u32 {
        self.attempts.peek(credential)
    }

    pub fn clear_recovery_attempts(&self, credential: &str) {
        self.attempts.reset(credential);
    }
}

async fn reauthenticate(
    store: &dyn SessionStore,
    backend: &dyn ReauthBackend,
    attempts: &AttemptCounter,
    timeout: Duration,
    credential: &str,
) -> RecoveryResult {
    let stale_cookie = store.get_cookie(credential);

    let reply = match tokio::time::timeout(
        timeout,
        backend.reauthenticate(credential, stale_cookie.as_deref()),
    )
    .await
    {
        Err(_) => {
            return Err(RecoveryError::Timeout { timeout_ms: timeout.as_millis() as u64 });
        },
        Ok(result) => result.map_err(RecoveryError::unexpected)?,
    };

    if !reply.is_success() {
        return Err(RecoveryError::ReauthenticationFailed {
            status: reply.status,
            message: reauth_error_message(&reply),
        });
    }

    let session_id =
        extract_session_id(&reply.headers).ok_or(RecoveryError::NoSessionIdReceived)?;
    let cookie = session_cookie(&session_id);
    let csrf_token = reply.body.get("csrfToken").and_then(Value::as_str);
    let new_token = reply
        .body
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty() && *token != credential)
        .map(str::to_string);

    match &new_token {
        Some(token) => {
            store.set_session(token, &cookie, csrf_token).map_err(RecoveryError::unexpected)?;
            store.clear_session(credential);
            attempts.reset(token);
            debug!(
                old = %mask_credential(credential),
                new = %mask_credential(token),
                "Backend rotated credential during recovery"
            );
        },
        None => {
            store.set_session(credential, &cookie, csrf_token).map_err(RecoveryError::unexpected)?;
        },
    }
    attempts.reset(credential);

    Ok(SessionRecovery { new_token })
}

fn reauth_error_message(reply: &UpstreamReply) -> String {
    if let Some(message) = reply.body.get("error").and_then(Value::as_str) {
        return message.to_string();
    }
    reqwest::StatusCode::from_u16(reply.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::session::store::InMemorySessionStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const TOKEN: &str = "test-jwt-token-12345";

    struct FakeBackend {
        reply: Result<UpstreamReply, UpstreamError>,
        delay: Duration,
        calls: AtomicUsize,
        seen_cookies: Mutex<Vec<Option<String>>>,
    }

    impl FakeBackend {
        fn replying(reply: UpstreamReply) -> Arc<Self> {
            Self::with(Ok(reply), Duration::ZERO)
        }

        fn with(reply: Result<UpstreamReply, UpstreamError>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply,
                delay,
                calls: AtomicUsize::new(0),
                seen_cookies: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReauthBackend for FakeBackend {
        async fn reauthenticate(
            &self,
            _credential: &str,
            stale_cookie: Option<&str>,
        ) -> Result<UpstreamReply, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_cookies.lock().unwrap().push(stale_cookie.map(str::to_string));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone()
        }
    }

    fn login_ok() -> UpstreamReply {
        UpstreamReply::new(200, json!({"status": "success"}))
            .with_header("set-cookie", "JSESSIONID=NEW123; Path=/; HttpOnly")
    }

    fn build_service(
        backend: Arc<FakeBackend>,
        config: RecoveryConfig,
    ) -> (SessionRecoveryService, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let service = SessionRecoveryService::new(store.clone(), backend, &config);
        (service, store)
    }

    #[tokio::test]
    async fn test_successful_recovery_updates_store() {
        let backend = FakeBackend::replying(login_ok());
        let (service, store) = build_service(backend.clone(), RecoveryConfig::default());
        store.set_session(TOKEN, "JSESSIONID=OLD", Some("CSRF-OLD")).unwrap();

        let result = service.recover_session(TOKEN).await.unwrap();
        assert_eq!(result.new_token, None);
        assert_eq!(store.get_cookie(TOKEN).as_deref(), Some("JSESSIONID=NEW123"));
        assert_eq!(store.get_csrf_token(TOKEN).as_deref(), Some("CSRF-OLD"));
        assert_eq!(service.recovery_attempts(TOKEN), 0);
        assert_eq!(
            backend.seen_cookies.lock().unwrap().as_slice(),
            &[Some("JSESSIONID=OLD".to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let backend = FakeBackend::replying(login_ok());
        let (service, _) = build_service(backend.clone(), RecoveryConfig::default());

        let err = service.recover_session("").await.unwrap_err();
        assert_eq!(err, RecoveryError::MissingCredential);
        assert_eq!(err.to_string(), "No user token provided");

        let err = service.recover_session("   ").await.unwrap_err();
        assert_eq!(err, RecoveryError::MissingCredential);
        assert_eq!(service.recovery_attempts("   "), 0);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_attempt_bound_without_session_cookie() {
        let backend = FakeBackend::replying(UpstreamReply::new(200, json!({})));
        let (service, _) = build_service(backend.clone(), RecoveryConfig::default());

        for attempt in 1..=3 {
            let err = service.recover_session(TOKEN).await.unwrap_err();
            assert_eq!(err, RecoveryError::NoSessionIdReceived);
            assert_eq!(service.recovery_attempts(TOKEN), attempt);
        }

        let err = service.recover_session(TOKEN).await.unwrap_err();
        assert_eq!(err.to_string(), "Maximum recovery attempts exceeded");
        assert_eq!(backend.calls(), 3);

        service.clear_recovery_attempts(TOKEN);
        assert!(matches!(
            service.recover_session(TOKEN).await,
            Err(RecoveryError::NoSessionIdReceived)
        ));
    }

    #[tokio::test]
    async fn test_backend_rejection_carries_status_and_message() {
        let backend = FakeBackend::replying(UpstreamReply::new(401, json!({})));
        let (service, _) = build_service(backend, RecoveryConfig::default());
        let err = service.recover_session(TOKEN).await.unwrap_err();
        assert_eq!(err.to_string(), "Re-authentication failed: 401 Unauthorized");

        let backend = FakeBackend::replying(UpstreamReply::new(500, json!({"error": "db down"})));
        let (service, _) = build_service(backend, RecoveryConfig::default());
        let err = service.recover_session(TOKEN).await.unwrap_err();
        assert_eq!(
            err,
            RecoveryError::ReauthenticationFailed { status: 500, message: "db down".into() }
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_wrapped() {
        let backend =
            FakeBackend::with(Err(UpstreamError::Transport("connection refused".into())), Duration::ZERO);
        let (service, _) = build_service(backend, RecoveryConfig::default());
        let err = service.recover_session(TOKEN).await.unwrap_err();
        assert_eq!(err, RecoveryError::unexpected("connection refused"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let backend = FakeBackend::with(Ok(login_ok()), Duration::from_secs(5));
        let config = RecoveryConfig { session_recovery_timeout_ms: 50, ..Default::default() };
        let (service, store) = build_service(backend, config);

        let err = service.recover_session(TOKEN).await.unwrap_err();
        assert_eq!(err, RecoveryError::Timeout { timeout_ms: 50 });
        assert_eq!(err.to_string(), "Session recovery timed out");
        assert!(store.get_cookie(TOKEN).is_none());
        assert_eq!(service.recovery_attempts(TOKEN), 1);
    }

    #[tokio::test]
    async fn test_token_rotation_moves_session() {
        let reply = UpstreamReply::new(200, json!({"token": "rotated-token-999", "csrfToken": "CSRF-NEW"}))
            .with_header("set-cookie", "JSESSIONID=ROT; Path=/");
        let backend = FakeBackend::replying(reply);
        let (service, store) = build_service(backend, RecoveryConfig::default());
        store.set_session(TOKEN, "JSESSIONID=OLD", None).unwrap();

        let result = service.recover_session(TOKEN).await.unwrap();
        assert_eq!(result.new_token.as_deref(), Some("rotated-token-999"));
        assert!(store.get_cookie(TOKEN).is_none());
        assert_eq!(store.get_cookie("rotated-token-999").as_deref(), Some("JSESSIONID=ROT"));
        assert_eq!(store.get_csrf_token("rotated-token-999").as_deref(), Some("CSRF-NEW"));
    }

    #[tokio::test]
    async fn test_same_token_in_body_is_not_rotation() {
        let reply = UpstreamReply::new(200, json!({"token": TOKEN}))
            .with_header("set-cookie", "JSESSIONID=SAME");
        let (service, store) = build_service(FakeBackend::replying(reply), RecoveryConfig::default());

        let result = service.recover_session(TOKEN).await.unwrap();
        assert!(result.new_token.is_none());
        assert_eq!(store.get_cookie(TOKEN).as_deref(), Some("JSESSIONID=SAME"));
    }

    #[tokio::test]
    async fn test_parallel_recoveries_share_one_call() {
        let backend = FakeBackend::with(Ok(login_ok()), Duration::from_millis(100));
        let (service, _) = build_service(backend.clone(), RecoveryConfig::default());

        let (results, active) = tokio::join!(
            futures::future::join_all((0..5).map(|_| service.recover_session(TOKEN))),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                service.is_recovery_active(TOKEN)
            }
        );

        assert!(active);
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(backend.calls(), 1);
        assert!(!service.is_recovery_active(TOKEN));
        assert_eq!(service.recovery_attempts(TOKEN), 0);
    }
}
