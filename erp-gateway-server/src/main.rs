//! ERP Gateway Server
//!
//! Proxies browser requests to the Etendo Classic backend, keeping one backend
//! session per bearer token alive through session and CSRF recovery.

use anyhow::Result;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

mod cli;
mod server_utils;

use cli::Cli;
use erp_gateway_core::modules::{config, logger};
use erp_gateway_core::{build_gateway_router, GatewayState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(Some(&cli.log_level));

    let mut gateway_config =
        config::load_config().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(url) = cli.erp_url.as_deref() {
        gateway_config.erp_base_url = url.trim_end_matches('/').to_string();
    }

    info!(
        erp = %gateway_config.erp_base_url,
        session_max_attempts = gateway_config.recovery.session_recovery_max_attempts,
        csrf_max_attempts = gateway_config.recovery.csrf_recovery_max_attempts,
        "ERP Gateway starting"
    );

    let state = GatewayState::from_config(gateway_config)?;
    let app = build_gateway_router(state).layer(
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    );

    let listener = server_utils::create_listener(&cli.host, cli.port).await?;
    axum::serve(listener, app).with_graceful_shutdown(server_utils::shutdown_signal()).await?;

    info!("ERP Gateway stopped");
    Ok(())
}
