//! # ERP Gateway Types
//!
//! Core types and error definitions for the ERP gateway.
//!
//! - **`error`** - Typed error hierarchy for the session store, recovery services
//!   and route handlers
//! - **`models`** - Configuration models and the caller-visible request outcome
//!
//! ## Architecture Role
//!
//! ```text
//!          erp-gateway-types (this crate)
//!                    │
//!                    ▼
//!           erp-gateway-core
//!                    │
//!                    ▼
//!          erp-gateway-server
//! ```

pub mod error;
pub mod models;

pub use error::{GatewayError, RecoveryError, RecoveryKind, SessionStoreError};
pub use models::{ForwardConfig, GatewayConfig, Outcome, RecoveryConfig};
