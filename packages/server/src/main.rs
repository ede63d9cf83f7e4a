//! AnimalTree Server Binary
//!
//! # Environment Variables
//!
//! - `ANIMALTREE_BIND`: Interface to listen on (default: 127.0.0.1)
//! - `ANIMALTREE_PORT`: Server port (default: 5000)
//! - `ANIMALTREE_DB_PATH`: Database file (default: ./database.db)
//! - `CORS_ALLOW_ORIGIN`: Comma-separated allowed origins (default: any)
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "animaltree_core=trace")
//!
//! The database is created and bootstrapped with its root animal before the
//! listener binds; a bootstrap failure aborts startup.

use std::sync::Arc;

use animaltree_core::TreeService;
use animaltree_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!("📦 Database: {}", config.database_path.display());

    let tree_service = TreeService::open(config.database_path.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize animal store: {}", e))?;

    tracing::info!(root_id = tree_service.root_id(), "✅ Store initialized");

    animaltree_server::start_server(Arc::new(tree_service), &config).await
}
