use std::sync::Arc;
use tracing::{info, warn};

use super::attempts::AttemptCounter;
use super::classifier::is_invalid_csrf_token_error;
use super::cookie::{extract_session_id, session_cookie};
use super::store::SessionStore;
use crate::modules::logger::mask_credential;
use crate::proxy::upstream::UpstreamReply;
use erp_gateway_types::{RecoveryConfig, RecoveryError, RecoveryKind};

/// Per-call overrides of the configured CSRF recovery settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfRecoveryOptions {
    pub enabled: Option<bool>,
    pub max_attempts: Option<u32>,
}

/// Successful CSRF recovery; the store now holds the new backend session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfRecovery {
    pub session_id: String,
}

/// Recovers from an `InvalidCSRFToken` response using the session cookie the
/// backend sent along with it. No extra round-trip is made.
pub struct CsrfRecoveryService {
    store: Arc<dyn SessionStore>,
    attempts: AttemptCounter,
    enabled: bool,
}

impl CsrfRecoveryService {
    pub fn new(store: Arc<dyn SessionStore>, config: &RecoveryConfig) -> Self {
        Self {
            store,
            attempts: AttemptCounter::new(RecoveryKind::Csrf, config.csrf_recovery_max_attempts),
            enabled: config.csrf_recovery_enabled,
        }
    }

    pub fn recover_from_csrf_error(
        &self,
        reply: &UpstreamReply,
        credential: &str,
        options: CsrfRecoveryOptions,
    ) -> Result<CsrfRecovery, RecoveryError> {
        if !options.enabled.unwrap_or(self.enabled) {
            return Err(RecoveryError::RecoveryDisabled);
        }
        if credential.trim().is_empty() {
            return Err(RecoveryError::MissingCredential);
        }
        if !is_invalid_csrf_token_error(&reply.body) {
            return Err(RecoveryError::NotCsrfError);
        }

        let max = options.max_attempts.filter(|m| *m > 0).unwrap_or(self.attempts.max());
        let attempt = self.attempts.try_begin_within(credential, max).inspect_err(|_| {
            warn!(credential = %mask_credential(credential), max, "CSRF recovery attempts exhausted");
        })?;

        if reply.status != 200 {
            return Err(RecoveryError::UnexpectedStatus { status: reply.status });
        }

        let Some(session_id) = extract_session_id(&reply.headers) else {
            warn!(
                credential = %mask_credential(credential),
                attempt,
                "No JSESSIONID found in CSRF error response headers"
            );
            return Err(RecoveryError::SessionUpdateFailed);
        };

        self.store
            .set_session(credential, &session_cookie(&session_id), None)
            .map_err(|_| RecoveryError::SessionUpdateFailed)?;
        self.attempts.reset(credential);

        info!(credential = %mask_credential(credential), attempt, "CSRF recovery successful");
        Ok(CsrfRecovery { session_id })
    }

    pub fn recovery_attempts(&self, credential: &str) -> u32 {
        self.attempts.peek(credential)
    }

    pub fn clear_recovery_attempts(&self, credential: &str) {
        self.attempts.reset(credential);
    }
}
