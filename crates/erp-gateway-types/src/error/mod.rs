//! Typed error definitions for the ERP gateway.
//!
//! All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging and outcome strings via Display
//! - **Matchable** for recovery routing via enum variants

mod gateway;
mod recovery;
mod session;

pub use gateway::GatewayError;
pub use recovery::{RecoveryError, RecoveryKind};
pub use session::SessionStoreError;
