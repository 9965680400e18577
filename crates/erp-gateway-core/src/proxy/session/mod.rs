//! Session lifecycle against the ERP backend: storage, failure classification,
//! re-authentication and CSRF recovery.

pub mod attempts;
pub mod classifier;
pub mod cookie;
pub mod csrf;
pub mod recovery;
pub mod store;

pub use attempts::AttemptCounter;
pub use classifier::{
    classify_session_error, is_invalid_csrf_token_error, is_session_expired,
    should_attempt_csrf_recovery, should_attempt_recovery, SessionErrorClass,
    INVALID_CSRF_TOKEN,
};
pub use cookie::{extract_session_id, session_cookie};
pub use csrf::{CsrfRecovery, CsrfRecoveryOptions, CsrfRecoveryService};
pub use recovery::{ReauthBackend, SessionRecovery, SessionRecoveryService};
pub use store::{InMemorySessionStore, SessionRecord, SessionStore};
