// Registry gateway HTTP server
// Exposes the search and plugin listing endpoints

pub mod handlers;
pub mod middleware;
pub mod observability;

use crate::config::Config;
use crate::service::RegistryService;
use crate::validator::ClientRegistry;
use anyhow::{Context, Result};
use axum::Router as AxumRouter;
use std::net::SocketAddr;
use std::sync::Arc;

use observability::Metrics;

/// Shared state for every handler. Read-only after startup apart from
/// the atomic counters.
#[derive(Clone)]
pub struct ServerState {
    pub service: Arc<RegistryService>,
    pub clients: Arc<ClientRegistry>,
    pub metrics: Arc<Metrics>,
}

impl ServerState {
    pub fn new(service: RegistryService, clients: ClientRegistry) -> Self {
        Self {
            service: Arc::new(service),
            clients: Arc::new(clients),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build state with real upstream clients
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = RegistryService::from_config(config)
            .context("Failed to create upstream clients")?;
        let clients = ClientRegistry::new(config.registered_clients.iter().cloned());
        Ok(Self::new(service, clients))
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            host: config.listen.host.clone(),
            port: config.listen.port,
        }
    }
}

/// Initialize logging for the server
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "registry_gateway=info,tower_http=warn,axum=warn".into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Run the HTTP server
pub fn run_server(config: &ServerConfig, app_config: &Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let state = ServerState::from_config(app_config)?;
        let registered = state.clients.len();
        let app = build_router(state);

        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], config.port)));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        tracing::info!("Plugin registry gateway listening on http://{}", addr);
        tracing::info!("API endpoints available:");
        tracing::info!("  POST /search      - Text search over plugin metadata");
        tracing::info!("  POST /getPlugins  - List plugins by asset type");
        tracing::info!("  GET  /health      - Health check");
        tracing::info!("  GET  /metrics     - Prometheus metrics");
        tracing::info!(
            "  Index: {}/{}",
            app_config.index.host_address,
            app_config.index.index_name
        );
        tracing::info!("  Registered clients: {}", registered);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok::<(), anyhow::Error>(())
    })
}

/// Build the router with all endpoints
pub fn build_router(state: ServerState) -> AxumRouter {
    use axum::http::Method;
    use axum::routing::{get, post};
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    AxumRouter::new()
        .route("/search", post(handlers::search))
        .route("/getPlugins", post(handlers::get_plugins))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_request_mw,
        ))
        .layer(cors)
        .with_state(state)
}
