//! HTTP server setup and configuration.

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::{ApiKey, Config};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub http_client: Client,
    pub config: Arc<Config>,
    /// Upstream credential resolved at startup; `None` makes `/chat` fail per request.
    pub api_key: Option<ApiKey>,
}

impl AppState {
    /// Build state with an HTTP client honoring the configured upstream timeout.
    pub fn new(config: Config, api_key: Option<ApiKey>) -> reqwest::Result<Self> {
        let http_client = Client::builder()
            .timeout(config.upstream.timeout())
            .build()?;

        Ok(Self {
            http_client,
            config: Arc::new(config),
            api_key,
        })
    }
}

/// Allow any origin, method and header with credentials.
///
/// A literal `*` cannot be sent alongside credentials, so the request's own
/// values are mirrored back instead.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        // State and middleware
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let listen_addr = config.server.listen.clone();

    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        tracing::warn!(
            var = %config.upstream.api_key_env,
            "Upstream credential not set - /chat will fail until it is provided"
        );
    }

    tracing::info!(
        upstream = %config.upstream.completions_url(),
        default_model = %config.upstream.default_model,
        timeout_secs = config.upstream.timeout_secs,
        "Configured upstream"
    );

    let state = AppState::new(config, api_key)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Starting chat relay server");

    axum::serve(listener, app).await?;

    Ok(())
}
