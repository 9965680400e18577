//! Gateway configuration loaded from environment variables.

use tracing::warn;
use validator::Validate;

use crate::error::{AppError, AppResult};
use erp_gateway_types::models::config::{
    DEFAULT_CSRF_RECOVERY_MAX_ATTEMPTS, DEFAULT_SESSION_RECOVERY_MAX_ATTEMPTS,
    DEFAULT_SESSION_RECOVERY_TIMEOUT_MS,
};
use erp_gateway_types::GatewayConfig;

pub const ENV_ERP_BASE_URL: &str = "ETENDO_CLASSIC_URL";
pub const ENV_FORWARD_COOKIES: &str = "ERP_FORWARD_COOKIES";
pub const ENV_CSRF_RECOVERY_ENABLED: &str = "CSRF_RECOVERY_ENABLED";
pub const ENV_SESSION_MAX_ATTEMPTS: &str = "SESSION_RECOVERY_MAX_ATTEMPTS";
pub const ENV_CSRF_MAX_ATTEMPTS: &str = "CSRF_RECOVERY_MAX_ATTEMPTS";
pub const ENV_SESSION_TIMEOUT_MS: &str = "SESSION_RECOVERY_TIMEOUT_MS";

/// Load configuration from the process environment.
pub fn load_config() -> AppResult<GatewayConfig> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_config_from<F>(lookup: F) -> AppResult<GatewayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::default();

    if let Some(url) = lookup(ENV_ERP_BASE_URL).map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
        config.erp_base_url = url.trim_end_matches('/').to_string();
    }

    // Only an explicit "false"/"0" turns forwarding off.
    if let Some(value) = lookup(ENV_FORWARD_COOKIES) {
        let value = value.trim().to_lowercase();
        config.forward.forward_cookies_enabled = !(value == "false" || value == "0");
    }

    if let Some(value) = lookup(ENV_CSRF_RECOVERY_ENABLED) {
        config.recovery.csrf_recovery_enabled = value.trim().eq_ignore_ascii_case("true");
    }

    config.recovery.session_recovery_max_attempts =
        parse_number(&lookup, ENV_SESSION_MAX_ATTEMPTS, DEFAULT_SESSION_RECOVERY_MAX_ATTEMPTS);
    config.recovery.csrf_recovery_max_attempts =
        parse_number(&lookup, ENV_CSRF_MAX_ATTEMPTS, DEFAULT_CSRF_RECOVERY_MAX_ATTEMPTS);
    config.recovery.session_recovery_timeout_ms =
        parse_number(&lookup, ENV_SESSION_TIMEOUT_MS, DEFAULT_SESSION_RECOVERY_TIMEOUT_MS);

    config
        .validate()
        .map_err(|e| AppError::Config(format!("Invalid gateway configuration: {}", e)))?;
    Ok(config)
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = key, value = %raw, "Ignoring unparsable numeric setting, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppResult<GatewayConfig> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        load_config_from(|key| map.get(key).cloned())
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        assert_eq!(load(&[]).unwrap(), GatewayConfig::default());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = load(&[(ENV_ERP_BASE_URL, "http://erp.local:8080/etendo/")]).unwrap();
        assert_eq!(config.erp_base_url, "http://erp.local:8080/etendo");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = load(&[(ENV_ERP_BASE_URL, "not a url")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_forward_cookies_switch() {
        for off in ["false", "FALSE", "0"] {
            assert!(!load(&[(ENV_FORWARD_COOKIES, off)]).unwrap().forward.forward_cookies_enabled);
        }
        for on in ["true", "yes", "1", "anything", ""] {
            assert!(load(&[(ENV_FORWARD_COOKIES, on)]).unwrap().forward.forward_cookies_enabled);
        }
    }

    #[test]
    fn test_csrf_switch_requires_literal_true() {
        assert!(load(&[(ENV_CSRF_RECOVERY_ENABLED, "TRUE")]).unwrap().recovery.csrf_recovery_enabled);
        assert!(!load(&[(ENV_CSRF_RECOVERY_ENABLED, "1")]).unwrap().recovery.csrf_recovery_enabled);
        assert!(!load(&[(ENV_CSRF_RECOVERY_ENABLED, "")]).unwrap().recovery.csrf_recovery_enabled);
    }

    #[test]
    fn test_numeric_settings() {
        let config = load(&[
            (ENV_SESSION_MAX_ATTEMPTS, "5"),
            (ENV_CSRF_MAX_ATTEMPTS, "2"),
            (ENV_SESSION_TIMEOUT_MS, "1500"),
        ])
        .unwrap();
        assert_eq!(config.recovery.session_recovery_max_attempts, 5);
        assert_eq!(config.recovery.csrf_recovery_max_attempts, 2);
        assert_eq!(config.recovery.session_recovery_timeout_ms, 1500);

        let config = load(&[(ENV_SESSION_MAX_ATTEMPTS, "many")]).unwrap();
        assert_eq!(config.recovery.session_recovery_max_attempts, 3);

        assert!(load(&[(ENV_CSRF_MAX_ATTEMPTS, "0")]).is_err());
        assert!(load(&[(ENV_SESSION_MAX_ATTEMPTS, "101")]).is_err());
    }
}
