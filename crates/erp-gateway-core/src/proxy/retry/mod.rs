//! Single-retry orchestration around one backend request.
//!
//! ```text
//! Initial ──► first request ──► CSRF error? ──► Recovering(Csrf) ──┐
//!                 │             expired + recoverable? ──► Recovering(Session)
//!                 │                                                ▼
//!                 └──────► Done ◄────────── second request ◄── Retrying
//! ```
//!
//! The request closure runs at most [`MAX_REQUEST_ATTEMPTS`] times per call.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::forwarding::{CookieForwarder, RequestContext};
use super::session::{
    is_session_expired, should_attempt_csrf_recovery, should_attempt_recovery, CsrfRecoveryOptions,
    CsrfRecoveryService, SessionRecoveryService,
};
use super::upstream::UpstreamReply;
use crate::error::UpstreamError;
use crate::modules::logger::mask_credential;
use erp_gateway_types::Outcome;


pub const MAX_REQUEST_ATTEMPTS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryPath {
    Csrf,
    Session,
}

#[derive(Debug)]
enum RetryState {
    Initial,
    Recovering { path: RecoveryPath, reply: UpstreamReply },
    Retrying { path: RecoveryPath, new_token: Option<String> },
    Done(Outcome),
}

pub struct RetryOrchestrator {
    forwarder: Arc<CookieForwarder>,
    session_recovery: Arc<SessionRecoveryService>,
    csrf_recovery: Arc<CsrfRecoveryService>,
}

impl RetryOrchestrator {
    pub fn new(
        forwarder: Arc<CookieForwarder>,
        session_recovery: Arc<SessionRecoveryService>,
        csrf_recovery: Arc<CsrfRecoveryService>,
    ) -> Self {
        Self { forwarder, session_recovery, csrf_recovery }
    }

    /// Run `request_fn`, recover the backend session if the reply asks for it,
    /// and replay the request once.
    ///
    /// `request_fn` receives the cookie header to send. It must perform exactly
    /// one backend call per invocation.
    pub async fn execute_with_recovery<F, Fut>(
        &self,
        context: &RequestContext,
        credential: &str,
        mut request_fn: F,
    ) -> Outcome
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<UpstreamReply, UpstreamError>>,
    {
        let mut requests: u8 = 0;
        let mut state = RetryState::Initial;

        loop {
            state = match state {
                RetryState::Initial => {
                    let cookie = self.forwarder.combined_cookie_header(context, Some(credential));
                    requests += 1;
                    match request_fn(cookie).await {
                        Ok(reply) => Self::classify_first(reply, credential),
                        Err(e) => RetryState::Done(Outcome::failure(e.to_string(), None, None)),
                    }
                },
                RetryState::Recovering { path, reply } => self.recover(path, reply, credential).await,
                RetryState::Retrying { path, new_token } => {
                    debug_assert!(requests < MAX_REQUEST_ATTEMPTS);
                    let token = new_token.as_deref().unwrap_or(credential);
                    let cookie = self.forwarder.combined_cookie_header(context, Some(token));
                    requests += 1;
                    match request_fn(cookie).await {
                        Ok(reply) => RetryState::Done(Self::finish_retry(path, reply, new_token)),
                        Err(e) => RetryState::Done(Outcome::failure(e.to_string(), None, None)),
                    }
                },
                RetryState::Done(outcome) => {
                    debug!(requests, success = outcome.success, "Request orchestration finished");
                    return outcome;
                },
            };
        }
    }

    fn classify_first(reply: UpstreamReply, credential: &str) -> RetryState {
        if should_attempt_csrf_recovery(&reply) {
            info!(credential = %mask_credential(credential), "InvalidCSRFToken detected, attempting CSRF recovery");
            return RetryState::Recovering { path: RecoveryPath::Csrf, reply };
        }
        if !is_session_expired(&reply) {
            return RetryState::Done(Outcome::ok(reply.body, reply.status));
        }
        if !should_attempt_recovery(&reply) {
            return RetryState::Done(Outcome::failure(
                format!("Request failed with status {}", reply.status),
                Some(reply.body),
                Some(reply.status),
            ));
        }
        info!(
            credential = %mask_credential(credential),
            status = reply.status,
            "Session expired, attempting session recovery"
        );
        RetryState::Recovering { path: RecoveryPath::Session, reply }
    }

    async fn recover(&self, path: RecoveryPath, reply: UpstreamReply, credential: &str) -> RetryState {
        let recovered = match path {
            RecoveryPath::Csrf => self
                .csrf_recovery
                .recover_from_csrf_error(&reply, credential, CsrfRecoveryOptions::default())
                .map(|_| None)
                .map_err(|e| format!("CSRF recovery failed: {}", e)),
            RecoveryPath::Session => self
                .session_recovery
                .recover_session(credential)
                .await
                .map(|r| r.new_token)
                .map_err(|e| format!("Session recovery failed: {}", e)),
        };

        match recovered {
            Ok(new_token) => RetryState::Retrying { path, new_token },
            Err(message) => {
                warn!(credential = %mask_credential(credential), error = %message, "Recovery failed, not retrying");
                RetryState::Done(Outcome::failure(message, Some(reply.body), Some(reply.status)))
            },
        }
    }

    fn finish_retry(path: RecoveryPath, reply: UpstreamReply, new_token: Option<String>) -> Outcome {
        match path {
            RecoveryPath::Csrf if should_attempt_csrf_recovery(&reply) => Outcome::failure(
                "Request failed even after CSRF recovery",
                Some(reply.body),
                Some(reply.status),
            ),
            RecoveryPath::Csrf => {
                info!("CSRF recovery and retry successful");
                Outcome::recovered(reply.body, reply.status, true)
            },
            RecoveryPath::Session if is_session_expired(&reply) => Outcome::failure(
                "Request failed even after session recovery",
                Some(reply.body),
                Some(reply.status),
            ),
            RecoveryPath::Session => {
                info!(rotated = new_token.is_some(), "Session recovery and retry successful");
                Outcome::recovered(reply.body, reply.status, false).with_new_token(new_token)
            },
        }
    }
}
