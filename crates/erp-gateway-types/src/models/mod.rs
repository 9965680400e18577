//! Configuration models and request outcomes.

pub mod config;
pub mod outcome;

pub use config::{ForwardConfig, GatewayConfig, RecoveryConfig};
pub use outcome::Outcome;
