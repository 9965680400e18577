//! Gateway, recovery and cookie-forwarding configuration types.

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_ERP_BASE_URL: &str = "http://localhost:8080/etendo";
pub const DEFAULT_SESSION_RECOVERY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_CSRF_RECOVERY_MAX_ATTEMPTS: u32 = 1;
pub const DEFAULT_SESSION_RECOVERY_TIMEOUT_MS: u64 = 30_000;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GatewayConfig {
    /// Backend ERP base URL, without trailing slash
    #[validate(url)]
    #[serde(default = "default_erp_base_url")]
    pub erp_base_url: String,
    /// Recovery bounds and switches
    #[validate(nested)]
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Cookie forwarding switches
    #[serde(default)]
    pub forward: ForwardConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            erp_base_url: default_erp_base_url(),
            recovery: RecoveryConfig::default(),
            forward: ForwardConfig::default(),
        }
    }
}

/// Session and CSRF recovery configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RecoveryConfig {
    /// Master switch for CSRF recovery
    #[serde(default = "default_true")]
    pub csrf_recovery_enabled: bool,
    /// Per-credential bound on session re-authentications
    #[validate(range(min = 1_u32, max = 100_u32))]
    #[serde(default = "default_session_max_attempts")]
    pub session_recovery_max_attempts: u32,
    /// Per-credential bound on CSRF recoveries
    #[validate(range(min = 1_u32, max = 100_u32))]
    #[serde(default = "default_csrf_max_attempts")]
    pub csrf_recovery_max_attempts: u32,
    /// Deadline of the re-authentication call
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_session_timeout_ms")]
    pub session_recovery_timeout_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            csrf_recovery_enabled: true,
            session_recovery_max_attempts: DEFAULT_SESSION_RECOVERY_MAX_ATTEMPTS,
            csrf_recovery_max_attempts: DEFAULT_CSRF_RECOVERY_MAX_ATTEMPTS,
            session_recovery_timeout_ms: DEFAULT_SESSION_RECOVERY_TIMEOUT_MS,
        }
    }
}

/// Cookie forwarding configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForwardConfig {
    /// Whether any cookie header is forwarded to the backend
    #[serde(default = "default_true")]
    pub forward_cookies_enabled: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self { forward_cookies_enabled: true }
    }
}

pub const fn default_true() -> bool {
    true
}

fn default_erp_base_url() -> String {
    DEFAULT_ERP_BASE_URL.to_string()
}

const fn default_session_max_attempts() -> u32 {
    DEFAULT_SESSION_RECOVERY_MAX_ATTEMPTS
}

const fn default_csrf_max_attempts() -> u32 {
    DEFAULT_CSRF_RECOVERY_MAX_ATTEMPTS
}

const fn default_session_timeout_ms() -> u64 {
    DEFAULT_SESSION_RECOVERY_TIMEOUT_MS
}
