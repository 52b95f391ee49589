//! margin-gateway server entry point.
//!
//! Starts the Axum HTTP server over the configured store.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use margin_gateway::api;
use margin_gateway::app_state::AppState;
use margin_gateway::config::GatewayConfig;
use margin_gateway::persistence::{MemoryStore, PoolStore, PostgresStore};
use margin_gateway::service::PoolService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting margin-gateway");

    // Build persistence layer
    let store: Arc<dyn PoolStore> = if config.persistence_enabled {
        Arc::new(PostgresStore::connect(&config).await?)
    } else {
        tracing::warn!("persistence disabled, using in-memory store");
        Arc::new(MemoryStore::new())
    };
    if config.schema_setup_on_start {
        store.setup().await?;
    }

    // Build service layer
    let pool_service = PoolService::new(store, config.statistic_default_delta);
    tracing::info!(
        default_delta = %pool_service.default_lookback(),
        "statistics lookback configured"
    );
    let app_state = AppState::new(pool_service);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
