//! Logging helpers shared by the recovery services and route handlers.

use tracing_subscriber::{fmt, EnvFilter};

const VISIBLE_CREDENTIAL_CHARS: usize = 10;

/// First characters of a credential followed by `...`, safe to log.
pub fn mask_credential(credential: &str) -> String {
    let visible: String = credential.chars().take(VISIBLE_CREDENTIAL_CHARS).collect();
    format!("{}...", visible)
}

/// Tracing filter from an explicit directive, then `RUST_LOG`, then `info`.
pub fn build_env_filter(level: Option<&str>) -> EnvFilter {
    level
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init_logger(level: Option<&str>) {
    let _ = fmt().with_env_filter(build_env_filter(level)).with_target(true).try_init();
}
