mod api;
mod config;
mod storage;
mod validation;

use crate::api::AppState;
use crate::config::{AppConfig, Backend};
use crate::storage::{ItemStore, JsonlStorage, MongoStorage};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("🛒 Starting Grocery Buddies API Server");

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    info!("📋 Configuration loaded");
    info!("   - Backend: {}", config.storage.backend);
    info!("   - Server: {}:{}", config.server.host, config.server.port);

    // Connect the document store once for the whole process
    info!("💾 Initializing document store...");
    let store = open_store(&config).await?;
    let item_count = store.count().await.unwrap_or(0);
    info!("✅ Document store ready ({} items)", item_count);

    let app = api::router(AppState { store });

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET  /                      - Greeting");
    info!("   GET  /health                - Health check");
    info!("   POST /item                  - Submit an item price");
    info!("   GET  /search?keyword=<name> - Search items by name");
    info!("   GET  /search?upc=<upc>      - Search items by UPC");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ItemStore>> {
    let storage = &config.storage;

    match storage.backend {
        Backend::Mongo => {
            let host = storage
                .mongo_host
                .as_deref()
                .context("MONGO_HOST is not set")?;
            let store = MongoStorage::connect(host, &storage.database, &storage.collection)
                .await
                .context("Failed to connect to MongoDB")?;
            Ok(Arc::new(store))
        }
        Backend::Jsonl => {
            let store = JsonlStorage::new(&storage.jsonl_path);
            store
                .initialize()
                .with_context(|| format!("Failed to open {:?}", storage.jsonl_path))?;
            info!(path = ?store.path(), "Using JSONL document store");
            Ok(Arc::new(store))
        }
    }
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
