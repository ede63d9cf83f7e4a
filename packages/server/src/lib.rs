//! AnimalTree HTTP Server
//!
//! REST API over [`TreeService`]. Each request runs on its own task and
//! each mutation opens and closes its own storage transaction, so the
//! router holds no shared mutable state beyond the service handle.
//!
//! # Usage
//!
//! ```bash
//! ANIMALTREE_PORT=5000 ANIMALTREE_DB_PATH=./database.db cargo run --bin animaltree-server
//! ```
//!
//! TLS is expected to be terminated by a reverse proxy in front of this
//! process.

use axum::{http::Method, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use animaltree_core::TreeService;

pub mod config;
mod http_error;
mod tree_endpoints;

pub use config::{ConfigError, ServerConfig};
pub use http_error::{HttpError, ERROR_CODE_HEADER};
pub use tree_endpoints::{InsertAnimalRequest, ReparentRequest};

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub tree_service: Arc<TreeService>,
}

/// Create the main application router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(tree_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}

/// Create CORS layer
///
/// Without configured origins any origin is allowed; the API carries no
/// credentials.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = if config.cors_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(config.cors_origins.clone())
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_credentials(false)
}

/// Start the HTTP server and run until Ctrl-C
///
/// # Errors
///
/// Returns error if the server fails to bind or stops abnormally.
pub async fn start_server(
    tree_service: Arc<TreeService>,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let state = AppState { tree_service };
    let app = create_router(state, config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 AnimalTree server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("AnimalTree server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
