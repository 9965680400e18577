use axum::{
    extract::Request,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::AppResult;
use crate::proxy::forwarding::CookieForwarder;
use crate::proxy::handlers;
use crate::proxy::retry::RetryOrchestrator;
use crate::proxy::session::{
    CsrfRecoveryService, InMemorySessionStore, ReauthBackend, SessionRecoveryService, SessionStore,
};
use crate::proxy::upstream::client::{build_http_client, ErpClient};
use erp_gateway_types::GatewayConfig;

/// Default timeout of one backend HTTP call, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

/// Axum application state.
///
/// Every service shares one session store, created once at startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub store: Arc<dyn SessionStore>,
    pub client: Arc<ErpClient>,
    pub forwarder: Arc<CookieForwarder>,
    pub session_recovery: Arc<SessionRecoveryService>,
    pub csrf_recovery: Arc<CsrfRecoveryService>,
    pub orchestrator: Arc<RetryOrchestrator>,
}

impl GatewayState {
    /// Wire the services around an injected store and HTTP client.
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn SessionStore>,
        http_client: reqwest::Client,
    ) -> AppResult<Self> {
        let client = Arc::new(ErpClient::new(http_client, &config.erp_base_url)?);
        let backend: Arc<dyn ReauthBackend> = client.clone();

        let forwarder = Arc::new(CookieForwarder::new(Arc::clone(&store), config.forward));
        let session_recovery =
            Arc::new(SessionRecoveryService::new(Arc::clone(&store), backend, &config.recovery));
        let csrf_recovery = Arc::new(CsrfRecoveryService::new(Arc::clone(&store), &config.recovery));
        let orchestrator = Arc::new(RetryOrchestrator::new(
            Arc::clone(&forwarder),
            Arc::clone(&session_recovery),
            Arc::clone(&csrf_recovery),
        ));

        tracing::info!(
            erp_base_url = %config.erp_base_url,
            csrf_recovery = config.recovery.csrf_recovery_enabled,
            forward_cookies = config.forward.forward_cookies_enabled,
            "Gateway state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            client,
            forwarder,
            session_recovery,
            csrf_recovery,
            orchestrator,
        })
    }

    /// In-memory store and the default HTTP client.
    pub fn from_config(config: GatewayConfig) -> AppResult<Self> {
        let http_client = build_http_client(DEFAULT_UPSTREAM_TIMEOUT_SECS)?;
        Self::new(config, Arc::new(InMemorySessionStore::new()), http_client)
    }
}

pub fn build_gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/api/datasource", post(handlers::datasource::handle_datasource))
        .route("/api/auth/keep-alive", post(handlers::keep_alive::handle_keep_alive))
        .route("/api/auth/login", post(handlers::auth::handle_login))
        .route("/api/auth/logout", post(handlers::auth::handle_logout))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                path = %request.uri().path()
            )
        }))
        .with_state(state)
}

async fn health_check_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
