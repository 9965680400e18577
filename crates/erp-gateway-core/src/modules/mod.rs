pub mod config;
pub mod logger;

pub use config::{load_config, load_config_from};
