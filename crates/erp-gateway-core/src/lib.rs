//! # ERP Gateway Core
//!
//! Keeps the gateway authenticated against a stateful, cookie-based ERP backend.
//!
//! ## Architecture
//!
//! ```text
//! erp-gateway-core/src/proxy/
//! ├── session/          # store, attempt counters, classifier, session + CSRF recovery
//! ├── retry/            # single-retry orchestrator state machine
//! ├── forwarding.rs     # browser cookie + ERP cookie header builder
//! ├── upstream/         # reqwest transport to the ERP backend
//! ├── handlers/         # datasource, keep-alive, login/logout routes
//! ├── middleware/       # bearer token extraction
//! └── server.rs         # axum router + shared state
//! ```

#![allow(
    clippy::significant_drop_tightening,
    reason = "DashMap guards in async code require careful lifetime management"
)]
#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
// Test-only lints: allow panic!, expect, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::assertions_on_result_states
    )
)]

pub mod error;
pub mod modules;
pub mod proxy;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use erp_gateway_types::{GatewayConfig, Outcome, RecoveryError};
pub use proxy::server::{build_gateway_router, GatewayState};
pub use proxy::session::{InMemorySessionStore, SessionStore};
